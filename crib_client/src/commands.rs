use cribbage::Card;
use std::fmt;

pub const HELP: &str = "\
<card>...  | select <card>...
        Toggle cards in or out of the selection, e.g. 'select ac kh' or just '10s'.
        Cards are a rank (A, 2-10, J, Q, K) followed by a suit (C, D, H, S).
submit | ok
        Send the selection: a discard during the discard, a play during the count.
discard
        Send the two selected cards to the crib.
play
        Play the selected card.
go | pass
        Say \"go\" when you can't play without passing 31.
clear
        Empty the selection.
refresh
        Fetch the game state now instead of waiting for the next poll.
stats
        Show your wins and games played.
help
        Show this help.
quit
        Leave the game.
";

/// A parsed line of user input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Toggle each card, in order.
    Select(Vec<String>),
    /// Send whatever the current phase offers.
    Submit,
    Discard,
    Play,
    Go,
    Clear,
    Refresh,
    Stats,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Select command without any cards.
    SelectMissingCards,
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectMissingCards => {
                write!(f, "Select requires at least one card (e.g., 'select ac kh')")
            }
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{}'. Type 'help' to see available commands",
                cmd
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a command string into a [`Command`].
///
/// Card notation is only checked for shape here when it's given without
/// a `select` prefix; the session validates it properly when toggling.
///
/// # Examples
///
/// ```
/// use crib_client::commands::{Command, parse_command};
///
/// assert_eq!(parse_command("ok"), Ok(Command::Submit));
/// assert_eq!(parse_command("pass"), Ok(Command::Go));
/// assert_eq!(
///     parse_command("select ac 10s"),
///     Ok(Command::Select(vec!["ac".to_string(), "10s".to_string()]))
/// );
/// assert_eq!(parse_command("KH"), Ok(Command::Select(vec!["KH".to_string()])));
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    match trimmed.to_ascii_lowercase().as_str() {
        "submit" | "ok" => return Ok(Command::Submit),
        "discard" => return Ok(Command::Discard),
        "play" => return Ok(Command::Play),
        "go" | "pass" => return Ok(Command::Go),
        "clear" => return Ok(Command::Clear),
        "refresh" => return Ok(Command::Refresh),
        "stats" => return Ok(Command::Stats),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.split_first() {
        Some((first, cards)) if first.eq_ignore_ascii_case("select") || *first == "s" => {
            if cards.is_empty() {
                Err(ParseError::SelectMissingCards)
            } else {
                Ok(Command::Select(cards.iter().map(|c| c.to_string()).collect()))
            }
        }
        Some(_) if parts.iter().all(|part| part.parse::<Card>().is_ok()) => {
            Ok(Command::Select(parts.iter().map(|c| c.to_string()).collect()))
        }
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}
