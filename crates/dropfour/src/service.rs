//! `GameService` builder and background tasks.
//!
//! This is the entry point the transport layer talks to. It ties the
//! layers together:
//!
//! ```text
//! request_match ──→ MatchQueue ──(pairing)──→ pump task ──→ SessionManager
//! submit_move / rematch / disconnect ─────────────────────→ SessionManager
//!                                           sweep task ──→ SessionManager::sweep
//! ```
//!
//! Every operation returns a typed error to the caller and also sends the
//! originating player a generic `Error` event.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use dropfour_lobby::{EnqueueOutcome, MatchPairing, MatchQueue, QueueConfig};
use dropfour_protocol::{Difficulty, GameEvent, PlayerId, PlayerInfo, RematchDecision, SessionId};
use dropfour_rules::MoveOutcome;
use dropfour_session::{
    GameStore, Notifier, RematchProgress, SessionConfig, SessionError, SessionManager,
};

use crate::{DropFourError, ServiceConfig};

/// Builder for configuring and starting a [`GameService`].
///
/// # Example
///
/// ```rust,ignore
/// use dropfour::prelude::*;
///
/// let notifier = Arc::new(ChannelNotifier::new());
/// let service = GameServiceBuilder::new()
///     .sweep_interval(Duration::from_secs(30))
///     .build(Arc::clone(&notifier), MemoryStore::new());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GameServiceBuilder {
    config: ServiceConfig,
}

impl GameServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session timers and retention limits.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the matchmaking configuration.
    pub fn queue_config(mut self, config: QueueConfig) -> Self {
        self.config.queue = config;
        self
    }

    /// Sets how often stale sessions are swept.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Builds the service and starts its background tasks.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn build<N: Notifier, S: GameStore>(self, notifier: N, store: S) -> GameService<N, S> {
        let sessions = SessionManager::new(self.config.session.clone(), notifier, store);
        let (queue, pairings) = MatchQueue::new(self.config.queue.clone());

        let tasks = vec![
            tokio::spawn(pump_pairings(sessions.clone(), queue.clone(), pairings)),
            tokio::spawn(sweep_loop(sessions.clone(), self.config.sweep_interval)),
        ];
        info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            wait_timeout_secs = self.config.queue.wait_timeout.as_secs(),
            "game service started"
        );

        GameService {
            sessions,
            queue,
            config: self.config,
            tasks: Mutex::new(tasks),
        }
    }
}

/// The running game service.
///
/// All methods take `&self`; share the service across connection tasks
/// with an `Arc`.
pub struct GameService<N: Notifier, S: GameStore> {
    sessions: SessionManager<N, S>,
    queue: MatchQueue,
    config: ServiceConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<N: Notifier, S: GameStore> GameService<N, S> {
    pub fn sessions(&self) -> &SessionManager<N, S> {
        &self.sessions
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Plays `player`'s piece into `column` in `session_id`.
    pub async fn submit_move(
        &self,
        session_id: SessionId,
        player: PlayerId,
        column: usize,
    ) -> Result<MoveOutcome, DropFourError> {
        let result = self.sessions.submit_move(session_id, player, column).await;
        self.report(player, result)
    }

    /// Puts `player` in the matchmaking queue.
    ///
    /// Any session the player still owns is cleaned up first; an
    /// unfinished game counts as abandoned. A player already waiting, or
    /// already paired and about to be seated, is left alone.
    pub async fn request_match(
        &self,
        player: PlayerInfo,
        difficulty: Difficulty,
    ) -> Result<EnqueueOutcome, DropFourError> {
        let id = player.id;
        self.sessions.force_cleanup_for_player(id).await;

        let result = self.queue.enqueue(player, difficulty).await;
        if let Ok(EnqueueOutcome::Waiting) = result {
            self.notifier()
                .send_to_player(id, GameEvent::QueueJoined { difficulty });
        }
        self.report(id, result)
    }

    /// Takes `player` out of the queue. Returns `false` if they were not
    /// waiting.
    pub async fn cancel_match_request(&self, player: PlayerId) -> bool {
        let removed = self.queue.dequeue(player).await;
        if removed {
            self.notifier().send_to_player(player, GameEvent::QueueLeft);
        }
        removed
    }

    pub async fn request_rematch(&self, player: PlayerId) -> Result<RematchProgress, DropFourError> {
        let result = self.sessions.request_rematch(player).await;
        self.report(player, result)
    }

    /// Answers a pending rematch request. Returns the new session's id if
    /// the rematch was accepted.
    pub async fn respond_to_rematch(
        &self,
        player: PlayerId,
        decision: RematchDecision,
    ) -> Result<Option<SessionId>, DropFourError> {
        let result = self.sessions.respond_to_rematch(player, decision).await;
        self.report(player, result)
    }

    /// Forgets a player whose connection went away: leaves the queue and
    /// ends or cleans up their session.
    pub async fn notify_disconnect(&self, player: PlayerId) {
        if self.queue.dequeue(player).await {
            debug!(player_id = %player, "disconnected player removed from queue");
        }
        match self.sessions.handle_disconnect(player).await {
            Ok(()) | Err(SessionError::SessionNotFound) => {}
            Err(err) => warn!(player_id = %player, error = %err, "disconnect cleanup failed"),
        }
    }

    /// Runs one sweep immediately instead of waiting for the next tick.
    pub async fn sweep(&self) -> usize {
        self.sessions.sweep().await
    }

    /// Stops background tasks, closes the queue, and tears down every
    /// session.
    pub async fn shutdown(&self) {
        for task in self.take_tasks() {
            task.abort();
        }
        for player in self.queue.shutdown().await {
            self.notifier().send_to_player(player, GameEvent::QueueLeft);
        }
        let sessions = self.sessions.shutdown().await;
        info!(sessions, "game service stopped");
    }

    fn notifier(&self) -> &N {
        self.sessions.notifier()
    }

    fn take_tasks(&self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Sends the error event for a failed request to `player`.
    fn report<T, E>(&self, player: PlayerId, result: Result<T, E>) -> Result<T, DropFourError>
    where
        E: Into<DropFourError>,
    {
        result.map_err(|err| {
            let err = err.into();
            debug!(player_id = %player, code = err.code(), error = %err, "request refused");
            self.notifier().send_to_player(player, err.to_event());
            err
        })
    }
}

impl<N: Notifier, S: GameStore> Drop for GameService<N, S> {
    fn drop(&mut self) {
        for task in self.take_tasks() {
            task.abort();
        }
    }
}

/// Starts a session for every pairing the queue produces.
///
/// Both humans are released from the queue once their session starts. If
/// one of them turned out to be seated elsewhere, only that player gets
/// the error and the other goes back in line.
async fn pump_pairings<N: Notifier, S: GameStore>(
    sessions: SessionManager<N, S>,
    queue: MatchQueue,
    mut pairings: mpsc::UnboundedReceiver<MatchPairing>,
) {
    while let Some(MatchPairing { first, second }) = pairings.recv().await {
        let humans: Vec<PlayerId> = [first.id, second.info().id]
            .into_iter()
            .filter(|id| !id.is_bot())
            .collect();

        let err = match sessions.start_session(first, second).await {
            Ok(_) => {
                for &player in &humans {
                    queue.release(player).await;
                }
                continue;
            }
            Err(err) => err,
        };

        warn!(error = %err, "could not start paired session");
        let conflicted = match &err {
            SessionError::AlreadyInSession(player, _) => Some(*player),
            _ => None,
        };
        let event = DropFourError::from(err).to_event();
        for player in humans {
            if conflicted.is_some_and(|seated| seated != player) {
                requeue_partner(&sessions, &queue, player).await;
            } else {
                queue.release(player).await;
                sessions.notifier().send_to_player(player, event.clone());
            }
        }
    }
    debug!("pairing channel closed");
}

/// Puts the innocent half of a failed pairing back in the queue.
async fn requeue_partner<N: Notifier, S: GameStore>(
    sessions: &SessionManager<N, S>,
    queue: &MatchQueue,
    player: PlayerId,
) {
    match queue.requeue(player).await {
        Ok(Some((EnqueueOutcome::Waiting, difficulty))) => {
            sessions
                .notifier()
                .send_to_player(player, GameEvent::QueueJoined { difficulty });
        }
        Ok(_) => {}
        Err(err) => {
            let err = DropFourError::from(err);
            sessions.notifier().send_to_player(player, err.to_event());
        }
    }
}

async fn sweep_loop<N: Notifier, S: GameStore>(
    sessions: SessionManager<N, S>,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        sessions.sweep().await;
    }
}
