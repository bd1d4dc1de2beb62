//! Plain-text rendering of a session for the terminal.

use cribbage::{Card, Controls, GameView, Phase, Session};
use std::fmt;

/// Game log lines shown under the table.
pub const LOG_LINES: usize = 10;

const WIDTH: usize = 60;

/// Clear the terminal and move the cursor to the top.
pub const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Render the session as the text the player sees.
#[must_use]
pub fn render(session: &Session) -> String {
    SessionDisplay(session).to_string()
}

struct SessionDisplay<'a>(&'a Session);

impl fmt::Display for SessionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.0;
        let identity = session.identity();

        writeln!(f, "{}", "═".repeat(WIDTH))?;
        match session.view() {
            Some(view) => writeln!(f, "CRIBBAGE  game {}", view.game_id)?,
            None => writeln!(f, "CRIBBAGE")?,
        }
        writeln!(f, "{}", "═".repeat(WIDTH))?;
        writeln!(f, "You: {identity}")?;

        if let Some(view) = session.view() {
            write_table(f, session, view)?;
        }

        writeln!(f, "{}", "─".repeat(WIDTH))?;
        write_controls(f, &session.controls())?;
        if !session.status().is_empty() {
            writeln!(f, "Status: {}", session.status())?;
        }

        if let Some(view) = session.view()
            && !view.game_log.is_empty()
        {
            writeln!(f, "{}", "─".repeat(WIDTH))?;
            let skip = view.game_log.len().saturating_sub(LOG_LINES);
            for line in &view.game_log[skip..] {
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, session: &Session, view: &GameView) -> fmt::Result {
    let me = &session.identity().player_id;

    writeln!(f, "Phase: {}", view.phase)?;
    for player in &view.players {
        let mut markers = Vec::new();
        if player.player_id == *me {
            markers.push("you");
            if view.is_dealer == Some(true) {
                markers.push("dealer");
            }
        }
        let markers = if markers.is_empty() {
            String::new()
        } else {
            format!(" ({})", markers.join(", "))
        };
        writeln!(f, "  {:<20} {:>3}{}", player.name, player.score, markers)?;
    }

    if let Some(starter) = view.starter() {
        writeln!(f, "Starter: {starter}")?;
    }
    if view.phase == Phase::Count {
        writeln!(
            f,
            "Count: {} ({})",
            cards(view.count_pile(), |_| false),
            view.count_total()
        )?;
    }

    let selection = session.selection();
    let hand = session.hand();
    if hand.is_empty() {
        writeln!(f, "Hand: -")
    } else {
        writeln!(f, "Hand: {}", cards(hand, |card| selection.contains(card)))
    }
}

fn write_controls(f: &mut fmt::Formatter<'_>, controls: &Controls) -> fmt::Result {
    writeln!(f, "{}", controls.prompt)?;
    if let Some(label) = controls.action_label() {
        let state = if controls.action_enabled {
            "ready, type 'submit'"
        } else {
            "not ready"
        };
        write!(f, "[{label}] {state}")?;
        if controls.pass_enabled {
            write!(f, "   [Go] type 'go'")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

/// Cards separated by spaces, selected ones in brackets.
fn cards(cards: &[Card], selected: impl Fn(Card) -> bool) -> String {
    if cards.is_empty() {
        return "-".to_string();
    }
    cards
        .iter()
        .map(|&card| {
            if selected(card) {
                format!("[{card}]")
            } else {
                card.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
