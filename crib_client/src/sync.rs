//! Keeps a [`Session`] in step with the server.
//!
//! The controller joins (retrying on a fixed delay), then runs a single
//! event loop that owns the session. Requests run as tasks in a
//! [`JoinSet`]; their responses come back into the loop one at a time, so
//! installing a snapshot or surfacing a failure never interleaves with
//! anything else. Every change to the session is published on a
//! [`watch`] channel for the presenter.

use cribbage::{
    ClientError, Completion, GameView, PlayerIdentity, RequestKind, Session, Ticket,
    messages::{ActionRequest, PlayerStats},
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{api_client::GameApi, commands::Command};

/// Timing policy for the controller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncConfig {
    pub poll_interval: Duration,
    pub join_retry_delay: Duration,
    /// `None` retries forever.
    pub join_max_attempts: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            join_retry_delay: Duration::from_secs(5),
            join_max_attempts: None,
        }
    }
}

/// Stops a running controller, including one still retrying its join.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<watch::Sender<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

enum Outgoing {
    Poll { player_id: String },
    Action(ActionRequest),
}

enum Reply {
    Snapshot(Ticket, Result<GameView, ClientError>),
    Acknowledged(Ticket, Result<(), ClientError>),
    Stats(Result<PlayerStats, ClientError>),
}

async fn send(api: &dyn GameApi, ticket: Ticket, outgoing: Outgoing) -> Reply {
    match outgoing {
        Outgoing::Poll { player_id } => Reply::Snapshot(ticket, api.fetch_state(&player_id).await),
        Outgoing::Action(ActionRequest::Discard(request)) => {
            Reply::Snapshot(ticket, api.discard(&request).await)
        }
        Outgoing::Action(ActionRequest::Play(request)) => {
            Reply::Snapshot(ticket, api.play(&request).await)
        }
        Outgoing::Action(ActionRequest::Go(request)) => {
            Reply::Acknowledged(ticket, api.go(&request).await)
        }
    }
}

pub struct SyncController {
    api: Arc<dyn GameApi>,
    config: SyncConfig,
    session: Session,
    updates: watch::Sender<Session>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop: watch::Receiver<bool>,
}

impl SyncController {
    pub fn new(api: Arc<dyn GameApi>, identity: PlayerIdentity, config: SyncConfig) -> Self {
        let session = Session::new(identity);
        let (updates, _) = watch::channel(session.clone());
        let (stop_tx, stop) = watch::channel(false);
        Self {
            api,
            config,
            session,
            updates,
            stop_tx: Arc::new(stop_tx),
            stop,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Receive a copy of the session after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.updates.subscribe()
    }

    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop_tx))
    }

    fn stopped(&self) -> bool {
        *self.stop.borrow()
    }

    fn publish(&self) {
        self.updates.send_replace(self.session.clone());
    }

    /// Join the game, retrying after `join_retry_delay` until it works,
    /// the attempt cap is reached or the controller is stopped.
    pub async fn join(&mut self) -> Result<(), ClientError> {
        let request = self.session.join_request();
        let mut attempts = 0u32;

        loop {
            if self.stopped() {
                return Err(ClientError::Stopped);
            }
            attempts += 1;
            info!(attempt = attempts, player = %self.session.identity(), "joining game");

            let ticket = self.session.begin(RequestKind::Join);
            let result = tokio::select! {
                result = self.api.join(&request) => result,
                _ = self.stop.changed() => return Err(ClientError::Stopped),
            };
            let outcome = self.session.complete(ticket, result);
            self.publish();

            let error = match outcome {
                Ok(_) => {
                    info!(attempt = attempts, "joined game");
                    return Ok(());
                }
                Err(error) => error,
            };
            if self
                .config
                .join_max_attempts
                .is_some_and(|max| attempts >= max)
            {
                warn!(attempts, %error, "giving up on joining");
                return Err(ClientError::JoinAbandoned { attempts });
            }

            warn!(
                attempt = attempts,
                %error,
                "join failed, retrying in {:?}",
                self.config.join_retry_delay
            );
            tokio::select! {
                () = time::sleep(self.config.join_retry_delay) => {}
                _ = self.stop.changed() => return Err(ClientError::Stopped),
            }
        }
    }

    /// Fetch the latest snapshot once.
    pub async fn poll(&mut self) -> Result<Completion, ClientError> {
        let ticket = self.session.begin(RequestKind::Poll);
        let result = self
            .api
            .fetch_state(&self.session.identity().player_id)
            .await;
        let outcome = self.session.complete(ticket, result);
        self.publish();
        outcome
    }

    /// Toggle cards into or out of the selection, stopping at the first
    /// refusal.
    pub fn toggle<S: AsRef<str>>(&mut self, cards: &[S]) -> Result<(), ClientError> {
        let result = cards
            .iter()
            .try_for_each(|card| self.session.toggle(card.as_ref()).map(|_| ()));
        self.publish();
        result
    }

    /// Join if needed, then poll and handle commands until stopped, until
    /// `commands` closes or a [`Command::Quit`] arrives.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<Command>) -> Result<(), ClientError> {
        if !self.session.is_active() {
            self.join().await?;
        }

        let period = self.config.poll_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: JoinSet<Reply> = JoinSet::new();

        loop {
            tokio::select! {
                _ = self.stop.changed() => break,
                _ = ticker.tick() => self.dispatch_poll(&mut in_flight),
                Some(joined) = in_flight.join_next() => match joined {
                    Ok(reply) => self.handle_reply(reply, &mut in_flight),
                    Err(error) => warn!(%error, "request task failed"),
                },
                command = commands.recv() => match command {
                    None | Some(Command::Quit) => break,
                    Some(command) => self.handle_command(command, &mut in_flight),
                },
            }
            self.publish();
        }

        info!(outstanding = in_flight.len(), "controller stopped");
        Ok(())
    }

    fn dispatch_poll(&mut self, in_flight: &mut JoinSet<Reply>) {
        let ticket = self.session.begin(RequestKind::Poll);
        let outgoing = Outgoing::Poll {
            player_id: self.session.identity().player_id.clone(),
        };
        self.dispatch(ticket, outgoing, in_flight);
    }

    fn dispatch(&self, ticket: Ticket, outgoing: Outgoing, in_flight: &mut JoinSet<Reply>) {
        debug!(seq = ticket.seq(), kind = %ticket.kind(), "dispatching request");
        let api = Arc::clone(&self.api);
        in_flight.spawn(async move { send(api.as_ref(), ticket, outgoing).await });
    }

    fn dispatch_prepared(
        &mut self,
        prepared: Result<(Ticket, ActionRequest), ClientError>,
        in_flight: &mut JoinSet<Reply>,
    ) {
        match prepared {
            Ok((ticket, request)) => self.dispatch(ticket, Outgoing::Action(request), in_flight),
            Err(error) => debug!(%error, "submission refused locally"),
        }
    }

    fn handle_command(&mut self, command: Command, in_flight: &mut JoinSet<Reply>) {
        match command {
            Command::Select(cards) => {
                if let Err(error) = self.toggle(cards.as_slice()) {
                    debug!(%error, "toggle refused");
                }
            }
            Command::Submit => {
                let prepared = self.session.prepare_submit();
                self.dispatch_prepared(prepared, in_flight);
            }
            Command::Discard => {
                let prepared = self.session.prepare_discard();
                self.dispatch_prepared(prepared, in_flight);
            }
            Command::Play => {
                let prepared = self.session.prepare_play();
                self.dispatch_prepared(prepared, in_flight);
            }
            Command::Go => {
                let prepared = self.session.prepare_go();
                self.dispatch_prepared(prepared, in_flight);
            }
            Command::Clear => self.session.clear_selection(),
            Command::Refresh => self.dispatch_poll(in_flight),
            Command::Stats => {
                let api = Arc::clone(&self.api);
                let player_id = self.session.identity().player_id.clone();
                in_flight.spawn(async move { Reply::Stats(api.player_stats(&player_id).await) });
            }
            Command::Help | Command::Quit => {}
        }
    }

    fn handle_reply(&mut self, reply: Reply, in_flight: &mut JoinSet<Reply>) {
        match reply {
            Reply::Snapshot(ticket, result) => {
                if let Err(error) = self.session.complete(ticket, result) {
                    debug!(seq = ticket.seq(), kind = %ticket.kind(), %error, "request failed");
                }
            }
            // No snapshot came back; fetch the state the action produced.
            Reply::Acknowledged(ticket, result) => match self.session.acknowledge(ticket, result) {
                Ok(()) => self.dispatch_poll(in_flight),
                Err(error) => {
                    debug!(seq = ticket.seq(), kind = %ticket.kind(), %error, "request failed");
                }
            },
            Reply::Stats(Ok(stats)) => self.session.set_status(format!(
                "{}: {} wins in {} games",
                stats.name, stats.wins, stats.games_played
            )),
            Reply::Stats(Err(error)) => self.session.set_status(error.to_string()),
        }
    }
}
