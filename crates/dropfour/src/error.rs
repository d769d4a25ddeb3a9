//! Unified error type for the dropfour service.

use dropfour_lobby::QueueError;
use dropfour_protocol::{GameEvent, ProtocolError};
use dropfour_rules::{MoveRejection, RulesError};
use dropfour_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// Every variant converts from its crate's error with `?`. Each error also
/// has a stable numeric [`code`](Self::code) that clients can switch on
/// without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropFourError {
    /// A move broke the rules.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// A session operation was refused.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Matchmaking is unavailable.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A request could not be parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl DropFourError {
    /// Stable error code.
    ///
    /// | Range | Source |
    /// |---|---|
    /// | 1xxx | rules |
    /// | 2xxx | session |
    /// | 3xxx | protocol |
    /// | 4xxx | matchmaking |
    pub fn code(&self) -> u16 {
        match self {
            Self::Rules(err) => rules_code(err),
            Self::Session(err) => match err {
                SessionError::Rules(err) => rules_code(err),
                SessionError::SessionNotFound => 2001,
                SessionError::NotAParticipant(_) => 2002,
                SessionError::RematchAlreadyPending => 2003,
                SessionError::NoRematchPending => 2004,
                SessionError::CannotRespondToOwnRequest => 2005,
                SessionError::GameInProgress => 2006,
                SessionError::AlreadyInSession(..) => 2007,
            },
            Self::Protocol(ProtocolError::UnknownDifficulty(_)) => 3001,
            Self::Protocol(ProtocolError::UnknownDecision(_)) => 3002,
            Self::Queue(QueueError::Closed) => 4001,
            Self::Queue(QueueError::BotIdentity) => 4002,
        }
    }

    /// The generic error event sent back to the player who caused it.
    pub fn to_event(&self) -> GameEvent {
        GameEvent::Error {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

fn rules_code(err: &RulesError) -> u16 {
    match err {
        RulesError::InvalidMove(MoveRejection::ColumnOutOfRange(_)) => 1001,
        RulesError::InvalidMove(MoveRejection::NotYourTurn) => 1002,
        RulesError::InvalidMove(MoveRejection::GameOver) => 1003,
        RulesError::InvalidMove(MoveRejection::SessionNotActive) => 1004,
        RulesError::ColumnFull(_) => 1005,
    }
}
