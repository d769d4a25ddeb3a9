//! Error types for matchmaking.

/// Errors returned by [`MatchQueue`](crate::MatchQueue) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The queue was shut down or nobody is receiving pairings anymore.
    #[error("matchmaking queue is closed")]
    Closed,

    /// The reserved bot id tried to join as a human.
    #[error("the bot player id cannot join the queue")]
    BotIdentity,
}
