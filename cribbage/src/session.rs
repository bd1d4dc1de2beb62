//! Session state for one player in one game.
//!
//! [`Session`] is the only writer of the installed snapshot and the
//! selection. Every request is tagged with a [`Ticket`] when it's issued,
//! and every response goes back through [`Session::complete`], which
//! either installs the snapshot or surfaces the failure ("go" is answered
//! without a snapshot and goes through [`Session::acknowledge`]). Responses older
//! than the installed snapshot are dropped, and so are poll responses that
//! land while a submission is outstanding, so an action's result can't be
//! overwritten by a poll that was answered before the action was applied.

use log::{debug, warn};
use std::fmt;

use super::{
    game::{
        controls::{ActionKind, Controls},
        entities::{Card, GameView, Phase, PlayerIdentity},
        selection::{Selection, Toggled},
    },
    net::{
        errors::{ClientError, Result},
        messages::{ActionRequest, DiscardRequest, GoRequest, JoinRequest, PlayRequest},
    },
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    Joining,
    Active,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RequestKind {
    Join,
    Poll,
    Discard,
    Play,
    Go,
}

impl RequestKind {
    /// Submissions, as opposed to join and poll.
    #[must_use]
    pub const fn is_action(self) -> bool {
        matches!(self, Self::Discard | Self::Play | Self::Go)
    }

    /// Message used when the server rejects a request without a reason.
    #[must_use]
    pub const fn fallback_reason(self) -> &'static str {
        match self {
            Self::Join => "Failed to join game",
            Self::Poll => "Failed to fetch game state",
            Self::Discard => "Failed to discard cards",
            Self::Play => "Failed to play card",
            Self::Go => "Failed to pass",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Join => "join",
            Self::Poll => "poll",
            Self::Discard => "discard",
            Self::Play => "play",
            Self::Go => "go",
        };
        write!(f, "{repr}")
    }
}

/// Handed out when a request is issued and returned with its response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ticket {
    seq: u64,
    kind: RequestKind,
}

impl Ticket {
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.seq
    }

    #[must_use]
    pub const fn kind(self) -> RequestKind {
        self.kind
    }
}

/// What happened to a successful response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Completion {
    Installed,
    /// A newer snapshot was already installed, or a submission was in
    /// flight when a poll answered.
    Stale,
}

#[derive(Clone, Debug)]
pub struct Session {
    identity: PlayerIdentity,
    state: SessionState,
    view: Option<GameView>,
    selection: Selection,
    status: String,
    next_seq: u64,
    installed_seq: u64,
    pending_action: Option<u64>,
    played: Option<Card>,
}

impl Session {
    #[must_use]
    pub fn new(identity: PlayerIdentity) -> Self {
        Self {
            identity,
            state: SessionState::Joining,
            view: None,
            selection: Selection::new(),
            status: "Joining game...".to_string(),
            next_seq: 0,
            installed_seq: 0,
            pending_action: None,
            played: None,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &PlayerIdentity {
        &self.identity
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The installed snapshot, if one has arrived.
    #[must_use]
    pub fn view(&self) -> Option<&GameView> {
        self.view.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        self.view.as_ref().map(|view| view.phase)
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The single user-visible status line.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Sequence number of the installed snapshot (0 before the first).
    #[must_use]
    pub fn installed_seq(&self) -> u64 {
        self.installed_seq
    }

    #[must_use]
    pub fn has_pending_action(&self) -> bool {
        self.pending_action.is_some()
    }

    /// The player's hand in the installed snapshot.
    #[must_use]
    pub fn hand(&self) -> &[Card] {
        self.view
            .as_ref()
            .map_or(&[], |view| view.hand(&self.identity.player_id))
    }

    #[must_use]
    pub fn controls(&self) -> Controls {
        match &self.view {
            Some(view) => Controls::for_view(view, &self.selection),
            None => Controls::joining(),
        }
    }

    #[must_use]
    pub fn join_request(&self) -> JoinRequest {
        JoinRequest {
            player_id: self.identity.player_id.clone(),
            name: self.identity.name.clone(),
        }
    }

    /// Tag a new request.
    pub fn begin(&mut self, kind: RequestKind) -> Ticket {
        self.next_seq += 1;
        let ticket = Ticket {
            seq: self.next_seq,
            kind,
        };
        if kind.is_action() {
            self.pending_action = Some(ticket.seq);
        }
        ticket
    }

    /// Toggle a card given in notation. Refusals and bad notation are
    /// surfaced in the status line and leave the selection unchanged.
    pub fn toggle(&mut self, notation: &str) -> Result<Toggled> {
        let phase = self.phase().unwrap_or_default();
        let outcome = notation
            .parse::<Card>()
            .map_err(ClientError::from)
            .and_then(|card| {
                self.selection
                    .toggle(card, phase)
                    .map_err(ClientError::from)
            });
        if let Err(error) = &outcome {
            self.status = error.to_string();
        }
        outcome
    }

    pub fn clear_selection(&mut self) {
        self.selection.reset();
    }

    /// Prepare whichever submission the current phase offers.
    pub fn prepare_submit(&mut self) -> Result<(Ticket, ActionRequest)> {
        match self.controls().action {
            Some(ActionKind::Discard) => self.prepare_discard(),
            Some(ActionKind::Play) => self.prepare_play(),
            None => Err(self.refuse("Nothing to submit right now")),
        }
    }

    pub fn prepare_discard(&mut self) -> Result<(Ticket, ActionRequest)> {
        self.check_idle()?;
        let controls = self.controls();
        if controls.action != Some(ActionKind::Discard) {
            return Err(self.refuse("Can only discard during DISCARD"));
        }
        let cards = match (controls.action_enabled, self.selection.cards()) {
            (true, [first, second]) => [*first, *second],
            _ => return Err(self.refuse("Please select exactly 2 cards to discard")),
        };

        let request = DiscardRequest::new(self.identity.player_id.clone(), cards);
        Ok((
            self.begin(RequestKind::Discard),
            ActionRequest::Discard(request),
        ))
    }

    pub fn prepare_play(&mut self) -> Result<(Ticket, ActionRequest)> {
        self.check_idle()?;
        let controls = self.controls();
        if controls.action != Some(ActionKind::Play) {
            return Err(self.refuse("Can only play during COUNT"));
        }
        if !controls.pass_enabled {
            return Err(self.refuse("Waiting for opponent"));
        }
        let card = match (controls.action_enabled, self.selection.cards()) {
            (true, [card]) => *card,
            _ => return Err(self.refuse("Please select exactly 1 card to play")),
        };

        self.played = Some(card);
        let request = PlayRequest::new(self.identity.player_id.clone(), card);
        Ok((self.begin(RequestKind::Play), ActionRequest::Play(request)))
    }

    pub fn prepare_go(&mut self) -> Result<(Ticket, ActionRequest)> {
        self.check_idle()?;
        if !self.controls().pass_enabled {
            return Err(self.refuse("Can only go on your turn during COUNT"));
        }

        let request = GoRequest {
            player_id: self.identity.player_id.clone(),
        };
        Ok((self.begin(RequestKind::Go), ActionRequest::Go(request)))
    }

    /// Finish a request. On success the snapshot is installed unless it's
    /// stale; on failure the installed snapshot and the selection are left
    /// alone and the error becomes the status line.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<GameView>,
    ) -> Result<Completion> {
        if self.pending_action == Some(ticket.seq) {
            self.pending_action = None;
        }

        let view = match result {
            Ok(view) => view,
            Err(error) => return Err(self.fail(ticket, error)),
        };

        let poll_during_action = ticket.kind == RequestKind::Poll && self.pending_action.is_some();
        if ticket.seq <= self.installed_seq || poll_during_action {
            debug!(
                "dropping stale {} response #{} (installed #{})",
                ticket.kind, ticket.seq, self.installed_seq
            );
            if ticket.kind.is_action() {
                self.selection.reset();
            }
            return Ok(Completion::Stale);
        }

        self.install(ticket, view);
        Ok(Completion::Installed)
    }

    /// Finish an action the server answers without a snapshot. Nothing is
    /// installed; the next poll brings the state the action produced.
    pub fn acknowledge(&mut self, ticket: Ticket, result: Result<()>) -> Result<()> {
        if self.pending_action == Some(ticket.seq) {
            self.pending_action = None;
        }
        if let Err(error) = result {
            return Err(self.fail(ticket, error));
        }

        debug!("{} #{} acknowledged", ticket.kind, ticket.seq);
        if ticket.kind == RequestKind::Go {
            self.status = "Passed".to_string();
        }
        self.selection.reset();
        Ok(())
    }

    fn fail(&mut self, ticket: Ticket, error: ClientError) -> ClientError {
        warn!("{} #{} failed: {error}", ticket.kind, ticket.seq);
        self.status = match ticket.kind {
            RequestKind::Join => format!("Error joining game: {error}"),
            _ => error.to_string(),
        };
        error
    }

    fn install(&mut self, ticket: Ticket, view: GameView) {
        let phase_changed = self
            .view
            .as_ref()
            .is_some_and(|installed| installed.phase != view.phase);

        match ticket.kind {
            RequestKind::Join => {
                self.state = SessionState::Active;
                self.status = format!("Joined game! Players: {}", view.players.len());
            }
            RequestKind::Poll | RequestKind::Go => {}
            RequestKind::Discard => self.status = "Cards discarded".to_string(),
            RequestKind::Play => {
                self.status = match self.played.take() {
                    Some(card) => format!("Played {card}"),
                    None => "Card played".to_string(),
                };
            }
        }
        if let Some(message) = view.message.as_deref().filter(|m| !m.is_empty()) {
            self.status = message.to_string();
        }

        let controls = Controls::new(view.phase, view.my_turn, self.selection.len());
        if ticket.kind.is_action() || phase_changed || controls.must_reset_selection {
            self.selection.reset();
        }
        self.selection.fit_to(view.phase);

        debug!("installed snapshot #{} in {}", ticket.seq, view.phase);
        self.installed_seq = ticket.seq;
        self.view = Some(view);
    }

    fn check_idle(&mut self) -> Result<()> {
        if self.pending_action.is_some() {
            return Err(self.refuse("Waiting for the previous action to finish"));
        }
        Ok(())
    }

    fn refuse(&mut self, reason: &str) -> ClientError {
        let error = ClientError::ActionUnavailable(reason.to_string());
        self.status = error.to_string();
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Player;
    use std::collections::BTreeMap;

    const ME: &str = "player_1";

    fn view(phase: Phase, my_turn: bool) -> GameView {
        let hand = ["AC", "KH", "5D", "5S", "JC", "10H"]
            .into_iter()
            .map(|n| n.parse().unwrap())
            .collect();
        GameView {
            game_id: "FIRST_GAME".to_string(),
            players: vec![
                Player {
                    player_id: ME.to_string(),
                    name: "Ann".to_string(),
                    score: 0,
                },
                Player {
                    player_id: "player_2".to_string(),
                    name: "Bob".to_string(),
                    score: 0,
                },
            ],
            visible_piles: BTreeMap::from([(ME.to_string(), hand)]),
            is_dealer: Some(true),
            my_turn,
            phase,
            message: None,
            game_log: Vec::new(),
        }
    }

    fn joined(phase: Phase, my_turn: bool) -> Session {
        let mut session = Session::new(PlayerIdentity::new(ME, "Ann"));
        let ticket = session.begin(RequestKind::Join);
        session.complete(ticket, Ok(view(phase, my_turn))).unwrap();
        session
    }

    fn poll(session: &mut Session, view: GameView) -> Result<Completion> {
        let ticket = session.begin(RequestKind::Poll);
        session.complete(ticket, Ok(view))
    }

    // === Join Tests ===

    #[test]
    fn test_new_session_is_joining() {
        let session = Session::new(PlayerIdentity::new(ME, "Ann"));
        assert_eq!(session.state(), SessionState::Joining);
        assert!(session.view().is_none());
        assert_eq!(session.controls(), Controls::joining());
        assert_eq!(session.status(), "Joining game...");
    }

    #[test]
    fn test_join_activates_session() {
        let session = joined(Phase::Discard, false);
        assert!(session.is_active());
        assert_eq!(session.status(), "Joined game! Players: 2");
        assert_eq!(session.hand().len(), 6);
        assert_eq!(session.installed_seq(), 1);
    }

    #[test]
    fn test_failed_join_stays_joining() {
        let mut session = Session::new(PlayerIdentity::new(ME, "Ann"));
        let ticket = session.begin(RequestKind::Join);
        let error = ClientError::NetworkFault("connection refused".to_string());
        assert_eq!(session.complete(ticket, Err(error.clone())), Err(error));
        assert_eq!(session.state(), SessionState::Joining);
        assert_eq!(
            session.status(),
            "Error joining game: Network error: connection refused"
        );
    }

    #[test]
    fn test_selection_refused_before_join() {
        let mut session = Session::new(PlayerIdentity::new(ME, "Ann"));
        let result = session.toggle("AC");
        assert!(matches!(result, Err(ClientError::SelectionNotAllowed(_))));
        assert!(session.selection().is_empty());
    }

    // === Selection Tests ===

    #[test]
    fn test_invalid_notation_is_surfaced() {
        let mut session = joined(Phase::Discard, false);
        let result = session.toggle("1Z");
        assert!(matches!(result, Err(ClientError::InvalidCard(_))));
        assert_eq!(session.status(), "Invalid card: 1Z");
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_selection_survives_poll_in_same_phase() {
        let mut session = joined(Phase::Discard, false);
        session.toggle("AC").unwrap();
        poll(&mut session, view(Phase::Discard, false)).unwrap();
        assert_eq!(session.selection().len(), 1);
    }

    #[test]
    fn test_selection_reset_on_phase_exit() {
        let mut session = joined(Phase::Discard, false);
        session.toggle("AC").unwrap();
        session.toggle("KH").unwrap();
        poll(&mut session, view(Phase::FlipStarter, false)).unwrap();
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_selection_reset_between_discard_and_count() {
        let mut session = joined(Phase::Discard, false);
        session.toggle("AC").unwrap();
        poll(&mut session, view(Phase::Count, true)).unwrap();
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_snapshot_message_overrides_status() {
        let mut session = joined(Phase::Discard, false);
        let mut next = view(Phase::Discard, false);
        next.message = Some("Bob discarded".to_string());
        poll(&mut session, next).unwrap();
        assert_eq!(session.status(), "Bob discarded");

        poll(&mut session, view(Phase::Discard, false)).unwrap();
        assert_eq!(session.status(), "Bob discarded");
    }

    // === Submission Tests ===

    #[test]
    fn test_discard_request_and_success() {
        let mut session = joined(Phase::Discard, false);
        session.toggle("AC").unwrap();
        session.toggle("KH").unwrap();

        let (ticket, request) = session.prepare_discard().unwrap();
        assert_eq!(ticket.kind(), RequestKind::Discard);
        assert_eq!(
            request,
            ActionRequest::Discard(DiscardRequest {
                player_id: ME.to_string(),
                card_indices: [0, 38],
            })
        );
        assert!(session.has_pending_action());

        let result = session.complete(ticket, Ok(view(Phase::Discard, false)));
        assert_eq!(result, Ok(Completion::Installed));
        assert!(session.selection().is_empty());
        assert!(!session.has_pending_action());
        assert_eq!(session.status(), "Cards discarded");
    }

    #[test]
    fn test_discard_needs_two_cards() {
        let mut session = joined(Phase::Discard, false);
        session.toggle("AC").unwrap();
        let result = session.prepare_discard();
        assert!(matches!(result, Err(ClientError::ActionUnavailable(_))));
        assert_eq!(session.status(), "Please select exactly 2 cards to discard");
        assert!(!session.has_pending_action());
    }

    #[test]
    fn test_play_requires_turn() {
        let mut session = joined(Phase::Count, false);
        session.toggle("5D").unwrap();
        assert_eq!(session.selection().len(), 1);
        assert!(!session.controls().action_enabled);
        assert!(matches!(
            session.prepare_play(),
            Err(ClientError::ActionUnavailable(_))
        ));
    }

    #[test]
    fn test_play_success_message() {
        let mut session = joined(Phase::Count, true);
        session.toggle("5D").unwrap();
        let (ticket, request) = session.prepare_submit().unwrap();
        assert_eq!(
            request,
            ActionRequest::Play(PlayRequest {
                player_id: ME.to_string(),
                card_idx: 17,
            })
        );
        session
            .complete(ticket, Ok(view(Phase::Count, false)))
            .unwrap();
        assert_eq!(session.status(), "Played 5D");
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_go_only_on_turn() {
        let mut session = joined(Phase::Count, false);
        assert!(session.prepare_go().is_err());

        let mut session = joined(Phase::Count, true);
        let (ticket, request) = session.prepare_go().unwrap();
        assert_eq!(
            request,
            ActionRequest::Go(GoRequest {
                player_id: ME.to_string()
            })
        );
        let installed = session.installed_seq();
        session.acknowledge(ticket, Ok(())).unwrap();
        assert_eq!(session.status(), "Passed");
        assert_eq!(session.installed_seq(), installed);
        assert!(!session.has_pending_action());
    }

    #[test]
    fn test_go_clears_selection_and_rejection_keeps_it() {
        let mut session = joined(Phase::Count, true);
        session.toggle("5D").unwrap();
        let (ticket, _) = session.prepare_go().unwrap();
        let error = ClientError::RejectedAction {
            status: 400,
            detail: "You have playable cards".to_string(),
        };
        assert_eq!(session.acknowledge(ticket, Err(error.clone())), Err(error));
        assert_eq!(session.status(), "You have playable cards");
        assert_eq!(session.selection().len(), 1);

        let (ticket, _) = session.prepare_go().unwrap();
        session.acknowledge(ticket, Ok(())).unwrap();
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_rejected_submission_keeps_state() {
        let mut session = joined(Phase::Count, true);
        session.toggle("5D").unwrap();
        let before = session.view().cloned();

        let (ticket, _) = session.prepare_play().unwrap();
        let error = ClientError::RejectedAction {
            status: 400,
            detail: "not your turn".to_string(),
        };
        assert_eq!(session.complete(ticket, Err(error.clone())), Err(error));

        assert_eq!(session.status(), "not your turn");
        assert_eq!(session.view().cloned(), before);
        assert_eq!(session.selection().len(), 1);
        assert!(!session.has_pending_action());
    }

    #[test]
    fn test_second_submission_waits_for_first() {
        let mut session = joined(Phase::Count, true);
        session.toggle("5D").unwrap();
        session.prepare_play().unwrap();
        assert!(session.prepare_play().is_err());
        assert!(session.prepare_go().is_err());
    }

    // === Ordering Tests ===

    #[test]
    fn test_older_response_is_dropped() {
        let mut session = joined(Phase::Discard, false);
        let early = session.begin(RequestKind::Poll);
        let late = session.begin(RequestKind::Poll);

        let result = session.complete(late, Ok(view(Phase::Count, true)));
        assert_eq!(result, Ok(Completion::Installed));
        let result = session.complete(early, Ok(view(Phase::Discard, false)));
        assert_eq!(result, Ok(Completion::Stale));
        assert_eq!(session.phase(), Some(Phase::Count));
    }

    #[test]
    fn test_poll_during_action_is_dropped() {
        let mut session = joined(Phase::Count, true);
        session.toggle("5D").unwrap();
        let poll_ticket = session.begin(RequestKind::Poll);
        let (play_ticket, _) = session.prepare_play().unwrap();

        let result = session.complete(poll_ticket, Ok(view(Phase::Count, true)));
        assert_eq!(result, Ok(Completion::Stale));
        assert_eq!(session.installed_seq(), 1);

        let mut after = view(Phase::Count, false);
        after.game_log.push("Ann played 5D".to_string());
        let result = session.complete(play_ticket, Ok(after.clone()));
        assert_eq!(result, Ok(Completion::Installed));
        assert_eq!(session.view(), Some(&after));
    }

    #[test]
    fn test_failed_poll_keeps_snapshot() {
        let mut session = joined(Phase::Discard, false);
        session.toggle("AC").unwrap();
        let before = session.view().cloned();

        let ticket = session.begin(RequestKind::Poll);
        let error = ClientError::MalformedSnapshot("missing field `phase`".to_string());
        assert!(session.complete(ticket, Err(error)).is_err());
        assert_eq!(session.view().cloned(), before);
        assert_eq!(session.selection().len(), 1);
        assert!(session.status().starts_with("Malformed game state"));
    }
}
