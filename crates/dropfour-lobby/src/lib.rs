//! Matchmaking for dropfour.
//!
//! Players wait in a FIFO [`MatchQueue`]. A second arrival is paired with
//! the longest-waiting player at once; a player who waits out the timeout
//! is paired with a bot at the difficulty they asked for. Pairings come
//! out of the channel returned by [`MatchQueue::new`], and whoever owns
//! that receiver starts the sessions.

mod config;
mod error;
mod queue;

pub use config::QueueConfig;
pub use error::QueueError;
pub use queue::{EnqueueOutcome, MatchPairing, MatchQueue};
