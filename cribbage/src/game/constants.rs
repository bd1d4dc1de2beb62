/// Number of distinct cards; valid indices are `0..DECK_SIZE`.
pub const DECK_SIZE: u8 = 52;

pub const CARDS_PER_SUIT: u8 = 13;

/// Rank symbols in index order (ace first).
pub const RANKS: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];

/// Face cards count as ten.
pub const MAX_POINT_VALUE: u8 = 10;

/// Cards each player sends to the crib.
pub const DISCARD_SIZE: usize = 2;

/// Cards played per turn during the count.
pub const PLAY_SIZE: usize = 1;

/// Pile holding the starter card once it's flipped.
pub const STARTER_PILE: &str = "starter";

/// Pile holding the cards played in the current count.
pub const COUNT_PILE: &str = "phase1";
