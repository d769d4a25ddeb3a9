//! Error types for the session layer.

use dropfour_protocol::{PlayerId, SessionId};
use dropfour_rules::{MoveRejection, RulesError};

/// Errors returned by session operations.
///
/// A failed operation never changes the session: a rejected move leaves
/// the game exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The move was refused by the rules or by the session state.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// No live session matches the request.
    #[error("session not found")]
    SessionNotFound,

    /// The player does not sit in this session.
    #[error("player {0} is not part of this session")]
    NotAParticipant(PlayerId),

    /// A rematch request is already waiting for an answer.
    #[error("a rematch request is already pending")]
    RematchAlreadyPending,

    /// There is no rematch request to answer.
    #[error("no rematch request is pending")]
    NoRematchPending,

    /// The requester tried to answer their own rematch request.
    #[error("cannot respond to your own rematch request")]
    CannotRespondToOwnRequest,

    /// A rematch was requested before the game finished.
    #[error("the game is still in progress")]
    GameInProgress,

    /// The player is already seated in another session.
    #[error("player {0} is already in session {1}")]
    AlreadyInSession(PlayerId, SessionId),
}

impl From<MoveRejection> for SessionError {
    fn from(reason: MoveRejection) -> Self {
        Self::Rules(reason.into())
    }
}

/// A finished game could not be stored.
///
/// Never propagated to players: the session logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to persist session {session_id}: {reason}")]
pub struct PersistenceFailure {
    pub session_id: SessionId,
    pub reason: String,
}

impl PersistenceFailure {
    pub fn new(session_id: SessionId, reason: impl Into<String>) -> Self {
        Self {
            session_id,
            reason: reason.into(),
        }
    }
}
