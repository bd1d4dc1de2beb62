//! JSON bodies exchanged with the game server.

use serde::{Deserialize, Serialize};

use super::super::game::entities::Card;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JoinRequest {
    pub player_id: String,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiscardRequest {
    pub player_id: String,
    pub card_indices: [u8; 2],
}

impl DiscardRequest {
    pub fn new(player_id: impl Into<String>, cards: [Card; 2]) -> Self {
        Self {
            player_id: player_id.into(),
            card_indices: cards.map(Card::index),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayRequest {
    pub player_id: String,
    pub card_idx: u8,
}

impl PlayRequest {
    pub fn new(player_id: impl Into<String>, card: Card) -> Self {
        Self {
            player_id: player_id.into(),
            card_idx: card.index(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GoRequest {
    pub player_id: String,
}

/// A submission ready to go over the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ActionRequest {
    Discard(DiscardRequest),
    Play(PlayRequest),
    Go(GoRequest),
}

/// Body of a non-success response.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The human-readable reason, if the server sent one as a string.
    /// Structured details (validation errors) yield `None`.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
    }

    /// Extract the reason from a raw response body.
    #[must_use]
    pub fn reason_from(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body)
            .ok()
            .and_then(|error| error.reason().map(str::to_string))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameList {
    #[serde(default)]
    pub games: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerStats {
    pub name: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub games_played: u32,
}
