//! Hooks into the world outside the session layer.
//!
//! The session layer never talks to sockets or databases. It reports what
//! happened through two traits the embedding server implements:
//!
//! - [`Notifier`] delivers events to connected players.
//! - [`GameStore`] persists finished games.
//!
//! Both are shared across tasks, hence `Send + Sync + 'static`.

use std::future::Future;
use std::sync::{Arc, Mutex};

use dropfour_protocol::{GameEvent, PlayerId};

use crate::{FinishedGame, PersistenceFailure};

/// Delivers events to players.
///
/// Called while a session lock is held, so implementations must not block
/// or await. Pushing into an unbounded channel is the expected shape.
/// Bot identities are never passed in.
pub trait Notifier: Send + Sync + 'static {
    /// Queues `event` for `player`. Unknown players are ignored.
    fn send_to_player(&self, player: PlayerId, event: GameEvent);

    /// Closes `player`'s connection with a human-readable reason.
    fn disconnect(&self, player: PlayerId, reason: &str);
}

impl<T: Notifier> Notifier for Arc<T> {
    fn send_to_player(&self, player: PlayerId, event: GameEvent) {
        (**self).send_to_player(player, event);
    }

    fn disconnect(&self, player: PlayerId, reason: &str) {
        (**self).disconnect(player, reason);
    }
}

/// Persists finished games.
///
/// Best effort: the session layer calls this from a spawned task after the
/// in-memory transition is complete, logs any failure, and never retries.
pub trait GameStore: Send + Sync + 'static {
    fn save_finished_game(
        &self,
        record: FinishedGame,
    ) -> impl Future<Output = Result<(), PersistenceFailure>> + Send;
}

impl<T: GameStore> GameStore for Arc<T> {
    fn save_finished_game(
        &self,
        record: FinishedGame,
    ) -> impl Future<Output = Result<(), PersistenceFailure>> + Send {
        (**self).save_finished_game(record)
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl GameStore for NoopStore {
    async fn save_finished_game(&self, _record: FinishedGame) -> Result<(), PersistenceFailure> {
        Ok(())
    }
}

/// Keeps records in memory. Useful for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<FinishedGame>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every record saved so far, oldest first.
    pub fn records(&self) -> Vec<FinishedGame> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl GameStore for MemoryStore {
    async fn save_finished_game(&self, record: FinishedGame) -> Result<(), PersistenceFailure> {
        let session_id = record.session_id;
        self.records
            .lock()
            .map_err(|_| PersistenceFailure::new(session_id, "record list poisoned"))?
            .push(record);
        Ok(())
    }
}
