//! Wire-level types for talking to the game server.
//!
//! The transport itself lives in the client crate; this module only
//! defines the JSON bodies and the error taxonomy they can produce.

/// Error types surfaced to the player.
pub mod errors;

/// Request and response bodies.
pub mod messages;
