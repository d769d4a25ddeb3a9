//! The waiting list and its per-player timers.
//!
//! All queue state sits behind one mutex. Wait timers take that same lock
//! when they fire and only act if the player is still queued under the
//! same timer, so a timer racing with a pairing or a cancel does nothing.
//!
//! A paired human stays known to the queue until the pairing's owner calls
//! [`MatchQueue::release`] or [`MatchQueue::requeue`]. Until then they
//! cannot join again.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use dropfour_protocol::{Difficulty, Opponent, PlayerId, PlayerInfo};
use dropfour_timer::{Timer, TimerId};

use crate::{QueueConfig, QueueError};

/// Two participants ready to play. `first` waited longer and moves first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPairing {
    pub first: PlayerInfo,
    pub second: Opponent,
}

/// What [`MatchQueue::enqueue`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The player is waiting; the bot fallback fires after the timeout.
    Waiting,
    /// The player was already waiting, or their pairing has not been
    /// released yet. Nothing changed.
    AlreadyQueued,
    /// The player was paired with someone who was waiting.
    Paired,
}

struct Waiting {
    player: PlayerInfo,
    difficulty: Difficulty,
    joined_at: Instant,
    timer: Timer,
}

#[derive(Default)]
struct QueueState {
    waiting: VecDeque<Waiting>,
    /// Humans in a sent pairing that has not been released.
    pairing: HashMap<PlayerId, (PlayerInfo, Difficulty)>,
    closed: bool,
}

impl QueueState {
    fn position(&self, player: PlayerId) -> Option<usize> {
        self.waiting.iter().position(|w| w.player.id == player)
    }

    fn holds(&self, player: PlayerId) -> bool {
        self.position(player).is_some() || self.pairing.contains_key(&player)
    }
}

struct Inner {
    state: Mutex<QueueState>,
    config: QueueConfig,
    pairings: mpsc::UnboundedSender<MatchPairing>,
}

/// FIFO matchmaking queue with a bot fallback.
///
/// Cheap to clone; clones share one queue.
#[derive(Clone)]
pub struct MatchQueue {
    inner: Arc<Inner>,
}

impl MatchQueue {
    /// Creates an empty queue and the receiver its pairings are sent to.
    pub fn new(config: QueueConfig) -> (Self, mpsc::UnboundedReceiver<MatchPairing>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                config,
                pairings: tx,
            }),
        };
        (queue, rx)
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Adds `player` to the queue, or pairs them with the player at the
    /// front.
    ///
    /// # Errors
    /// - [`QueueError::BotIdentity`] for [`PlayerId::BOT`]
    /// - [`QueueError::Closed`] after shutdown, or if the pairing receiver
    ///   has been dropped
    pub async fn enqueue(
        &self,
        player: PlayerInfo,
        difficulty: Difficulty,
    ) -> Result<EnqueueOutcome, QueueError> {
        if player.id.is_bot() {
            return Err(QueueError::BotIdentity);
        }
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(QueueError::Closed);
        }
        if state.holds(player.id) {
            debug!(player_id = %player.id, "already queued");
            return Ok(EnqueueOutcome::AlreadyQueued);
        }
        self.admit(&mut state, player, difficulty)
    }

    /// Forgets that `player` is part of a pending pairing. Called once their
    /// session has started or failed to start.
    pub async fn release(&self, player: PlayerId) -> bool {
        self.inner.state.lock().await.pairing.remove(&player).is_some()
    }

    /// Puts a player from a failed pairing back in line with the difficulty
    /// they originally asked for. They pair with whoever is waiting, or wait
    /// again with a fresh timer.
    ///
    /// Returns `None` if `player` is not part of a pending pairing.
    ///
    /// # Errors
    /// [`QueueError::Closed`] after shutdown, or if the pairing receiver
    /// has been dropped.
    pub async fn requeue(
        &self,
        player: PlayerId,
    ) -> Result<Option<(EnqueueOutcome, Difficulty)>, QueueError> {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(QueueError::Closed);
        }
        let Some((entry, difficulty)) = state.pairing.remove(&player) else {
            return Ok(None);
        };
        info!(player_id = %player, "player returned to queue");
        let outcome = self.admit(&mut state, entry, difficulty)?;
        Ok(Some((outcome, difficulty)))
    }

    /// True while `player` is in a pairing that has not been released.
    pub async fn is_pairing(&self, player: PlayerId) -> bool {
        self.inner.state.lock().await.pairing.contains_key(&player)
    }

    fn admit(
        &self,
        state: &mut QueueState,
        player: PlayerInfo,
        difficulty: Difficulty,
    ) -> Result<EnqueueOutcome, QueueError> {
        let Some(front) = state.waiting.pop_front() else {
            let timer = self.arm_wait_timer(player.id);
            info!(player_id = %player.id, %difficulty, "player queued");
            state.waiting.push_back(Waiting {
                player,
                difficulty,
                joined_at: Instant::now(),
                timer,
            });
            return Ok(EnqueueOutcome::Waiting);
        };

        front.timer.cancel();
        info!(
            first = %front.player.id,
            second = %player.id,
            waited_ms = front.joined_at.elapsed().as_millis() as u64,
            "players paired"
        );
        state
            .pairing
            .insert(front.player.id, (front.player.clone(), front.difficulty));
        state.pairing.insert(player.id, (player.clone(), difficulty));
        let pairing = MatchPairing {
            first: front.player,
            second: Opponent::Human(player),
        };
        if self.inner.pairings.send(pairing).is_err() {
            warn!("pairing receiver dropped, closing queue");
            close(state);
            return Err(QueueError::Closed);
        }
        Ok(EnqueueOutcome::Paired)
    }

    /// Removes `player` from the queue and cancels their timer. Returns
    /// `false` if they were not queued.
    pub async fn dequeue(&self, player: PlayerId) -> bool {
        let mut state = self.inner.state.lock().await;
        let Some(index) = state.position(player) else {
            return false;
        };
        if let Some(entry) = state.waiting.remove(index) {
            entry.timer.cancel();
        }
        info!(player_id = %player, "player left queue");
        true
    }

    pub async fn is_queued(&self, player: PlayerId) -> bool {
        self.inner.state.lock().await.position(player).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.waiting.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.state.lock().await.waiting.is_empty()
    }

    /// Closes the queue, cancels every wait timer, and returns the players
    /// who were still waiting.
    pub async fn shutdown(&self) -> Vec<PlayerId> {
        let mut state = self.inner.state.lock().await;
        let dropped = close(&mut state);
        info!(dropped = dropped.len(), "matchmaking queue shut down");
        dropped
    }

    fn arm_wait_timer(&self, player: PlayerId) -> Timer {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        Timer::schedule(self.inner.config.wait_timeout, move |id| async move {
            if let Some(inner) = inner.upgrade() {
                expire_wait(&inner, player, id).await;
            }
        })
    }
}

/// Bot fallback for a player whose wait timer fired.
async fn expire_wait(inner: &Inner, player: PlayerId, id: TimerId) {
    let mut state = inner.state.lock().await;
    let Some(index) = state.position(player) else {
        debug!(player_id = %player, timer = %id, "stale wait timer");
        return;
    };
    if state.waiting[index].timer.id() != id {
        debug!(player_id = %player, timer = %id, "stale wait timer");
        return;
    }
    let Some(entry) = state.waiting.remove(index) else {
        return;
    };

    info!(player_id = %player, difficulty = %entry.difficulty, "wait timed out, pairing with bot");
    state
        .pairing
        .insert(player, (entry.player.clone(), entry.difficulty));
    let pairing = MatchPairing {
        first: entry.player,
        second: Opponent::Bot {
            difficulty: entry.difficulty,
        },
    };
    if inner.pairings.send(pairing).is_err() {
        warn!(player_id = %player, "pairing receiver dropped, closing queue");
        close(&mut state);
    }
}

fn close(state: &mut QueueState) -> Vec<PlayerId> {
    state.closed = true;
    state.pairing.clear();
    state
        .waiting
        .drain(..)
        .map(|entry| {
            entry.timer.cancel();
            entry.player.id
        })
        .collect()
}
