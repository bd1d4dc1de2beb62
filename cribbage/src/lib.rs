//! # Cribbage
//!
//! The local half of a networked cribbage client. The server owns the game;
//! this crate owns what the player is allowed to do with it.
//!
//! ## Architecture
//!
//! - **Card codec**: [`Card`] maps notation such as `10S` to the server's
//!   wire index (`suit * 13 + rank - 1`) and back.
//! - **Selection**: [`Selection`] holds the cards picked for the next
//!   submission; its capacity depends on the phase (two during the discard,
//!   one during the count, none otherwise).
//! - **Controls**: [`Controls`] decides the prompt, the offered action and
//!   whether it can be submitted.
//! - **Session**: [`Session`] installs server snapshots, orders responses
//!   and turns failures into a status line.
//!
//! ## Example
//!
//! ```
//! use cribbage::{Card, Phase, Selection};
//!
//! let mut selection = Selection::new();
//! let ace: Card = "AC".parse().unwrap();
//! selection.toggle(ace, Phase::Discard).unwrap();
//! assert_eq!(ace.index(), 0);
//! assert!(!selection.is_submittable(Phase::Discard));
//! ```

/// Cards, snapshots, selection and controls.
pub mod game;
pub use game::{
    ActionKind, Card, CardError, Controls, GameView, Phase, Player, PlayerIdentity, Selection,
    SelectionRefusal, Suit, Toggled, capacity, constants, decode, encode,
};

/// Wire bodies and the error taxonomy.
pub mod net;
pub use net::{errors::ClientError, messages};

/// Snapshot installation and request ordering.
pub mod session;
pub use session::{Completion, RequestKind, Session, SessionState, Ticket};
