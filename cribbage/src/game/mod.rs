//! Client-side game model.
//!
//! This module holds everything the client derives locally:
//! - Card notation and wire indices
//! - Server snapshots (`GameView`) and phases
//! - The player's in-progress selection and its capacity rule
//! - The controls offered for a snapshot

pub mod constants;
pub mod controls;
pub mod entities;
pub mod selection;

pub use controls::{ActionKind, Controls};
pub use entities::{
    Card, CardError, GameView, Phase, Player, PlayerIdentity, Suit, decode, encode,
};
pub use selection::{Selection, SelectionRefusal, Toggled, capacity};
