use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;

use super::constants::{
    CARDS_PER_SUIT, COUNT_PILE, DECK_SIZE, MAX_POINT_VALUE, RANKS, STARTER_PILE,
};

/// Errors from converting between card notation and card indices.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CardError {
    #[error("Invalid card: {0}")]
    InvalidNotation(String),
    #[error("Invalid card index: {0}")]
    IndexOutOfRange(i64),
}

/// Suits in wire order. The ordinal is part of the card index, so the
/// declaration order must not change.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Club, Self::Diamond, Self::Heart, Self::Spade];

    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Club => 'C',
            Self::Diamond => 'D',
            Self::Heart => 'H',
            Self::Spade => 'S',
        }
    }

    /// Case-insensitive inverse of [`Suit::letter`].
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'C' => Some(Self::Club),
            'D' => Some(Self::Diamond),
            'H' => Some(Self::Heart),
            'S' => Some(Self::Spade),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Club => "Clubs",
            Self::Diamond => "Diamonds",
            Self::Heart => "Hearts",
            Self::Spade => "Spades",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// A card identified by its wire index, `suit * 13 + (rank - 1)`.
///
/// The index is the canonical identity shared with the server. Construction
/// always goes through [`Card::new`] or parsing, so every `Card` holds an
/// index in `0..52`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Card(u8);

impl Card {
    pub fn new(index: u8) -> Result<Self, CardError> {
        if index < DECK_SIZE {
            Ok(Self(index))
        } else {
            Err(CardError::IndexOutOfRange(index.into()))
        }
    }

    /// Build a card from a rank (ace=1 ... king=13) and a suit.
    pub fn from_rank_and_suit(rank: u8, suit: Suit) -> Result<Self, CardError> {
        if (1..=CARDS_PER_SUIT).contains(&rank) {
            Ok(Self(suit.ordinal() * CARDS_PER_SUIT + rank - 1))
        } else {
            Err(CardError::InvalidNotation(format!("{rank}{}", suit.letter())))
        }
    }

    /// Every card in index order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..DECK_SIZE).map(Self)
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Rank from ace=1 to king=13.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 % CARDS_PER_SUIT + 1
    }

    #[must_use]
    pub const fn suit(self) -> Suit {
        Suit::ALL[(self.0 / CARDS_PER_SUIT) as usize]
    }

    /// Counting value: pip cards count their rank, face cards count ten.
    #[must_use]
    pub const fn point_value(self) -> u8 {
        let rank = self.rank();
        if rank > MAX_POINT_VALUE {
            MAX_POINT_VALUE
        } else {
            rank
        }
    }

    #[must_use]
    pub const fn rank_symbol(self) -> &'static str {
        RANKS[(self.0 % CARDS_PER_SUIT) as usize]
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank_symbol(), self.suit().letter())
    }
}

impl FromStr for Card {
    type Err = CardError;

    /// Parse `<rank><suit>` notation such as `AC`, `10s` or `qh`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CardError::InvalidNotation(s.to_string());
        let mut chars = s.trim().chars();
        let suit = chars
            .next_back()
            .and_then(Suit::from_letter)
            .ok_or_else(invalid)?;
        let rank = chars.as_str();
        let rank_idx = RANKS
            .iter()
            .position(|symbol| symbol.eq_ignore_ascii_case(rank))
            .ok_or_else(invalid)?;
        Ok(Self(suit.ordinal() * CARDS_PER_SUIT + rank_idx as u8))
    }
}

impl TryFrom<i64> for Card {
    type Error = CardError;

    fn try_from(index: i64) -> Result<Self, Self::Error> {
        u8::try_from(index)
            .ok()
            .and_then(|idx| Self::new(idx).ok())
            .ok_or(CardError::IndexOutOfRange(index))
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> Self {
        card.0
    }
}

/// Notation to wire index.
pub fn encode(notation: &str) -> Result<u8, CardError> {
    notation.parse::<Card>().map(Card::index)
}

/// Wire index to notation.
pub fn decode(index: u8) -> Result<String, CardError> {
    Card::new(index).map(|card| card.to_string())
}

/// Stage of a hand as reported by the server. The wire format is the
/// ordinal (1-8); upper-case names are accepted too.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "u8")]
pub enum Phase {
    #[default]
    Join = 1,
    Deal = 2,
    Discard = 3,
    FlipStarter = 4,
    Count = 5,
    Show = 6,
    Crib = 7,
    Done = 8,
}

impl Phase {
    pub const ALL: [Self; 8] = [
        Self::Join,
        Self::Deal,
        Self::Discard,
        Self::FlipStarter,
        Self::Count,
        Self::Show,
        Self::Crib,
        Self::Done,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Join => "JOIN",
            Self::Deal => "DEAL",
            Self::Discard => "DISCARD",
            Self::FlipStarter => "FLIP_STARTER",
            Self::Count => "COUNT",
            Self::Show => "SHOW",
            Self::Crib => "CRIB",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase as u8
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|phase| u8::from(*phase) == code)
            .ok_or_else(|| format!("unknown phase {code}"))
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown phase {s:?}"))
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(u8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Phase::try_from(code),
            Repr::Name(name) => name.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    #[serde(alias = "id")]
    pub player_id: String,
    pub name: String,
    #[serde(default)]
    pub score: u32,
}

/// Who this client plays as. Fixed for the lifetime of a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerIdentity {
    pub player_id: String,
    pub name: String,
}

impl PlayerIdentity {
    pub fn new(player_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.player_id)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Server-issued snapshot of the game as seen by one player.
///
/// Snapshots replace each other wholesale; nothing is merged field by
/// field. Piles the player can't see are simply absent.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameView {
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<Player>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visible_piles: BTreeMap<String, Vec<Card>>,
    #[serde(default)]
    pub is_dealer: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub my_turn: bool,
    pub phase: Phase,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_log: Vec<String>,
}

impl GameView {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn pile(&self, name: &str) -> &[Card] {
        self.visible_piles.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn hand(&self, player_id: &str) -> &[Card] {
        self.pile(player_id)
    }

    #[must_use]
    pub fn starter(&self) -> Option<Card> {
        self.pile(STARTER_PILE).first().copied()
    }

    /// Cards played so far in the current count.
    #[must_use]
    pub fn count_pile(&self) -> &[Card] {
        self.pile(COUNT_PILE)
    }

    /// Running total of the current count.
    #[must_use]
    pub fn count_total(&self) -> u32 {
        self.count_pile()
            .iter()
            .map(|card| u32::from(card.point_value()))
            .sum()
    }

    #[must_use]
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Card Tests ===

    #[test]
    fn test_encode_ten_of_spades() {
        assert_eq!(encode("10S"), Ok(48));
        assert_eq!(decode(48).as_deref(), Ok("10S"));
    }

    #[test]
    fn test_encode_is_case_insensitive() {
        assert_eq!(encode("ac"), Ok(0));
        assert_eq!(encode("Kd"), Ok(25));
        assert_eq!(encode("qH"), Ok(37));
        assert_eq!(encode(" 7c "), Ok(6));
    }

    #[test]
    fn test_encode_rejects_unknown_vocabulary() {
        for bad in ["", "A", "1C", "11S", "01H", "ZS", "AX", "10", "A C", "♠A", "AS!"] {
            assert_eq!(
                encode(bad),
                Err(CardError::InvalidNotation(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        assert_eq!(decode(52), Err(CardError::IndexOutOfRange(52)));
        assert_eq!(Card::try_from(-1), Err(CardError::IndexOutOfRange(-1)));
    }

    #[test]
    fn test_card_rank_and_suit() {
        let card: Card = "JH".parse().unwrap();
        assert_eq!(card.rank(), 11);
        assert_eq!(card.suit(), Suit::Heart);
        assert_eq!(card.suit().name(), "Hearts");
        assert_eq!(card.index(), 2 * 13 + 10);
    }

    #[test]
    fn test_point_value_caps_face_cards() {
        let values: Vec<u8> = Card::all()
            .filter(|card| card.suit() == Suit::Club)
            .map(Card::point_value)
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10]);
    }

    #[test]
    fn test_from_rank_and_suit() {
        let card = Card::from_rank_and_suit(1, Suit::Spade).unwrap();
        assert_eq!(card.to_string(), "AS");
        assert!(Card::from_rank_and_suit(0, Suit::Spade).is_err());
        assert!(Card::from_rank_and_suit(14, Suit::Spade).is_err());
    }

    #[test]
    fn test_suit_display() {
        assert_eq!(format!("{}", Suit::Club), "♣");
        assert_eq!(format!("{}", Suit::Diamond), "♦");
        assert_eq!(format!("{}", Suit::Heart), "♥");
        assert_eq!(format!("{}", Suit::Spade), "♠");
    }

    // === Phase Tests ===

    #[test]
    fn test_phase_from_wire_code() {
        let phase: Phase = serde_json::from_str("5").unwrap();
        assert_eq!(phase, Phase::Count);
        assert_eq!(serde_json::to_string(&Phase::FlipStarter).unwrap(), "4");
    }

    #[test]
    fn test_phase_from_name() {
        let phase: Phase = serde_json::from_str("\"flip_starter\"").unwrap();
        assert_eq!(phase, Phase::FlipStarter);
    }

    #[test]
    fn test_phase_rejects_unknown_code() {
        assert!(serde_json::from_str::<Phase>("0").is_err());
        assert!(serde_json::from_str::<Phase>("9").is_err());
        assert!(serde_json::from_str::<Phase>("\"SHUFFLE\"").is_err());
    }

    // === GameView Tests ===

    #[test]
    fn test_game_view_from_server_payload() {
        let json = r#"{
            "game_id": "FIRST_GAME",
            "players": [
                {"player_id": "p1", "name": "Ann", "score": 12},
                {"player_id": "p2", "name": "Bob", "score": 9}
            ],
            "visible_piles": {"starter": [4], "phase1": [12, 4], "p1": [0, 13, 26]},
            "is_dealer": true,
            "my_turn": true,
            "phase": 5,
            "game_log": ["game.phase -> COUNT"]
        }"#;
        let view = GameView::from_json(json).unwrap();
        assert_eq!(view.phase, Phase::Count);
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.player("p2").map(|p| p.score), Some(9));
        assert_eq!(view.starter().map(|c| c.to_string()).as_deref(), Some("5C"));
        assert_eq!(view.hand("p1").len(), 3);
        assert!(view.hand("p2").is_empty());
        assert_eq!(view.count_total(), 10 + 5);
        assert_eq!(view.message, None);
    }

    #[test]
    fn test_game_view_tolerates_nulls() {
        let json = r#"{"players": null, "visible_piles": null, "is_dealer": null,
                       "my_turn": null, "phase": 1, "game_log": null}"#;
        let view = GameView::from_json(json).unwrap();
        assert!(view.players.is_empty());
        assert!(view.visible_piles.is_empty());
        assert!(!view.my_turn);
        assert_eq!(view.starter(), None);
    }

    #[test]
    fn test_game_view_rejects_bad_card_index() {
        let json = r#"{"phase": 3, "visible_piles": {"p1": [0, 52]}}"#;
        assert!(GameView::from_json(json).is_err());
    }

    #[test]
    fn test_game_view_requires_phase() {
        assert!(GameView::from_json(r#"{"players": []}"#).is_err());
    }

    #[test]
    fn test_player_accepts_id_alias() {
        let player: Player = serde_json::from_str(r#"{"id": "p9", "name": "Cy"}"#).unwrap();
        assert_eq!(player.player_id, "p9");
        assert_eq!(player.score, 0);
    }
}
