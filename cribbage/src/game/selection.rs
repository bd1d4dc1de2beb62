//! Cards the player has picked but not yet submitted.

use thiserror::Error;

use super::{
    constants::{DISCARD_SIZE, PLAY_SIZE},
    entities::{Card, Phase},
};

/// Why a toggle was refused. Refusals leave the selection untouched.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum SelectionRefusal {
    #[error("Select exactly {capacity} cards")]
    Full { capacity: usize },
    #[error("Cards can't be selected during {phase}")]
    Closed { phase: Phase },
}

/// What a successful toggle did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Toggled {
    Selected(Card),
    Deselected(Card),
    /// Single-card phases behave like radio buttons.
    Replaced { old: Card, new: Card },
}

/// How many cards may be selected during `phase`.
#[must_use]
pub const fn capacity(phase: Phase) -> usize {
    match phase {
        Phase::Discard => DISCARD_SIZE,
        Phase::Count => PLAY_SIZE,
        _ => 0,
    }
}

/// Ordered set of selected cards. Insertion order is kept so submissions
/// go out in the order the player picked them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    cards: Vec<Card>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, card: Card, phase: Phase) -> Result<Toggled, SelectionRefusal> {
        let capacity = capacity(phase);
        if capacity == 0 {
            return Err(SelectionRefusal::Closed { phase });
        }

        if let Some(pos) = self.cards.iter().position(|selected| *selected == card) {
            self.cards.remove(pos);
            return Ok(Toggled::Deselected(card));
        }

        if capacity == 1
            && let Some(old) = self.cards.first().copied()
        {
            self.cards.clear();
            self.cards.push(card);
            return Ok(Toggled::Replaced { old, new: card });
        }

        if self.cards.len() >= capacity {
            return Err(SelectionRefusal::Full { capacity });
        }

        self.cards.push(card);
        Ok(Toggled::Selected(card))
    }

    pub fn reset(&mut self) {
        self.cards.clear();
    }

    /// Drop everything if the selection no longer fits `phase`.
    pub fn fit_to(&mut self, phase: Phase) {
        if self.cards.len() > capacity(phase) {
            self.reset();
        }
    }

    #[must_use]
    pub fn is_submittable(&self, phase: Phase) -> bool {
        let capacity = capacity(phase);
        capacity > 0 && self.cards.len() == capacity
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
