//! Cancelable one-shot timers for dropfour.
//!
//! A [`Timer`] runs a callback once after a delay on its own Tokio task.
//! Every timer gets a process-unique [`TimerId`] that is passed to the
//! callback when it fires.
//!
//! # Stale fires
//!
//! Cancelling a timer aborts its task, but a callback that has already
//! woken up may be waiting on a lock when the abort happens and run anyway.
//! Owners guard against this by keeping the `Timer` in their locked state
//! and comparing ids after taking the lock:
//!
//! ```ignore
//! let timer = Timer::schedule(window, move |id| async move {
//!     let mut state = shared.lock().await;
//!     if state.timer.as_ref().map(Timer::id) != Some(id) {
//!         return; // cancelled or replaced while we were waiting
//!     }
//!     state.timer.take();
//!     // ... act on the expiry
//! });
//! ```
//!
//! Dropping a `Timer` detaches it: the callback still fires. Call
//! [`Timer::cancel`] to stop it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one scheduled timer. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    fn next() -> Self {
        Self(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A one-shot callback scheduled on the Tokio runtime.
#[derive(Debug)]
pub struct Timer {
    id: TimerId,
    fires_at: Instant,
    handle: JoinHandle<()>,
}

impl Timer {
    /// Runs `callback` once after `delay`.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn schedule<F, Fut>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce(TimerId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = TimerId::next();
        let fires_at = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            time::sleep_until(fires_at).await;
            tracing::trace!(timer = %id, "timer fired");
            callback(id).await;
        });
        tracing::trace!(timer = %id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        Self {
            id,
            fires_at,
            handle,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// When the timer is (or was) due.
    pub fn fires_at(&self) -> Instant {
        self.fires_at
    }

    /// Time left until the timer is due, zero once it is.
    pub fn remaining(&self) -> Duration {
        self.fires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the timer task has run to completion or was aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the timer. A callback that already started keeps running up
    /// to its next await point, so callbacks must still check their id.
    pub fn cancel(self) {
        tracing::trace!(timer = %self.id, "timer cancelled");
        self.handle.abort();
    }
}

/// Cancels the timer in `slot`, if any, leaving `None` behind.
pub fn cancel_slot(slot: &mut Option<Timer>) {
    if let Some(timer) = slot.take() {
        timer.cancel();
    }
}

/// Whether `slot` currently holds the timer identified by `id`.
pub fn holds(slot: &Option<Timer>, id: TimerId) -> bool {
    slot.as_ref().is_some_and(|timer| timer.id == id)
}
