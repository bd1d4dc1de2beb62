//! Errors surfaced by the client session.

use thiserror::Error;

use super::super::game::{entities::CardError, selection::SelectionRefusal};

/// Every failure the session can surface to the player. Each one is
/// handled where it happens and turned into a status message; none of
/// them ends the session.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ClientError {
    /// Local notation parse failure. Never sent to the server.
    #[error(transparent)]
    InvalidCard(#[from] CardError),

    /// Local capacity rule violation.
    #[error(transparent)]
    SelectionNotAllowed(#[from] SelectionRefusal),

    /// A submission was requested while the controls don't offer it.
    #[error("{0}")]
    ActionUnavailable(String),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    NetworkFault(String),

    /// The server answered with a non-success status.
    #[error("{detail}")]
    RejectedAction { status: u16, detail: String },

    /// A response body that isn't a game snapshot.
    #[error("Malformed game state: {0}")]
    MalformedSnapshot(String),

    #[error("Gave up joining after {attempts} attempts")]
    JoinAbandoned { attempts: u32 },

    #[error("Session stopped")]
    Stopped,
}

impl ClientError {
    /// True for errors raised locally, before any request was made.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidCard(_) | Self::SelectionNotAllowed(_) | Self::ActionUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedSnapshot(error.to_string())
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, ClientError>;
