//! Which action the player is offered, and whether it can be submitted.
//!
//! Everything here is a pure function of the phase, turn ownership and
//! selection size. Nothing else may change whether submission is enabled.

use super::{
    constants::{DISCARD_SIZE, PLAY_SIZE},
    entities::{GameView, Phase},
    selection::Selection,
};

/// The submit action offered in a phase.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ActionKind {
    Discard,
    Play,
}

impl ActionKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::Play => "play",
        }
    }

    /// Number of cards the action submits.
    #[must_use]
    pub const fn card_count(self) -> usize {
        match self {
            Self::Discard => DISCARD_SIZE,
            Self::Play => PLAY_SIZE,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Controls {
    pub prompt: String,
    pub action: Option<ActionKind>,
    pub action_enabled: bool,
    /// Whether "go" may be sent. Independent of `action_enabled`.
    pub pass_enabled: bool,
    pub must_reset_selection: bool,
}

impl Controls {
    #[must_use]
    pub fn new(phase: Phase, my_turn: bool, selected: usize) -> Self {
        let (prompt, action, action_enabled) = match phase {
            Phase::Discard => (
                "Select two cards to discard".to_string(),
                Some(ActionKind::Discard),
                selected == DISCARD_SIZE,
            ),
            Phase::Count => (
                if my_turn {
                    "Select a card to play".to_string()
                } else {
                    "Waiting for opponent".to_string()
                },
                Some(ActionKind::Play),
                my_turn && selected == PLAY_SIZE,
            ),
            Phase::Done => ("Game over".to_string(), None, false),
            other => (format!("Game phase: {other}"), None, false),
        };

        Self {
            prompt,
            action,
            action_enabled,
            pass_enabled: phase == Phase::Count && my_turn,
            must_reset_selection: !matches!(phase, Phase::Discard | Phase::Count),
        }
    }

    #[must_use]
    pub fn for_view(view: &GameView, selection: &Selection) -> Self {
        Self::new(view.phase, view.my_turn, selection.len())
    }

    /// Controls shown before the first snapshot arrives.
    #[must_use]
    pub fn joining() -> Self {
        Self {
            prompt: "Joining game...".to_string(),
            action: None,
            action_enabled: false,
            pass_enabled: false,
            must_reset_selection: true,
        }
    }

    #[must_use]
    pub fn action_label(&self) -> Option<&'static str> {
        self.action.map(ActionKind::label)
    }
}
