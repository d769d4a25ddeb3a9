//! Error types for the rules engine.

/// Why a move counts as invalid.
///
/// Only `ColumnOutOfRange` and `GameOver` are produced by this crate. The
/// session layer uses the other variants when it refuses a move before it
/// ever reaches the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("column {0} is out of range")]
    ColumnOutOfRange(usize),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("the game is already over")]
    GameOver,

    #[error("the session is not active")]
    SessionNotActive,
}

/// Errors returned by board and game operations.
///
/// A rejected move never changes the board or the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The move is not legal for a reason other than a full column.
    #[error("invalid move: {0}")]
    InvalidMove(MoveRejection),

    /// The column has no empty cell left.
    #[error("column {0} is full")]
    ColumnFull(usize),
}

impl From<MoveRejection> for RulesError {
    fn from(reason: MoveRejection) -> Self {
        Self::InvalidMove(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_error_display() {
        let err = RulesError::ColumnFull(3);
        assert_eq!(err.to_string(), "column 3 is full");

        let err: RulesError = MoveRejection::ColumnOutOfRange(9).into();
        assert_eq!(err.to_string(), "invalid move: column 9 is out of range");
    }
}
