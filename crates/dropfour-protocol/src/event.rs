//! Events the service sends to players.
//!
//! Every event is addressed to exactly one player; broadcasting to both
//! participants means sending the same event twice. Bots never receive
//! events.

use serde::{Deserialize, Serialize};

use crate::{Board, Difficulty, PlayerId, PlayerInfo, Seat, SessionId};

/// How a finished game came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "seat", rename_all = "snake_case")]
pub enum Outcome {
    Winner(Seat),
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Seat> {
        match self {
            Self::Winner(seat) => Some(seat),
            Self::Draw => None,
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Someone connected four.
    FourInARow,
    /// The board filled up with no winner.
    BoardFull,
    /// A player left while the game was still running.
    Abandoned,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FourInARow => write!(f, "four in a row"),
            Self::BoardFull => write!(f, "board full"),
            Self::Abandoned => write!(f, "abandonment/disconnect"),
        }
    }
}

/// A notification for one player.
///
/// `#[serde(tag = "type")]` gives `{ "type": "MoveApplied", ... }`, the
/// same internally tagged shape clients already parse for system messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// A new session started. `seat` is the recipient's seat.
    GameStarted {
        session_id: SessionId,
        opponent: PlayerInfo,
        seat: Seat,
        turn: Seat,
        board: Board,
    },

    /// A piece was placed. `next_turn` is `None` when the move ended the game.
    MoveApplied {
        session_id: SessionId,
        column: usize,
        row: usize,
        seat: Seat,
        board: Board,
        next_turn: Option<Seat>,
    },

    /// The game is over.
    GameOver {
        session_id: SessionId,
        outcome: Outcome,
        winner: Option<PlayerId>,
        reason: EndReason,
        board: Board,
        rematch_offered: bool,
    },

    /// The opponent wants a rematch; answer within `respond_within_secs`.
    RematchRequested {
        session_id: SessionId,
        requester: PlayerId,
        respond_within_secs: u64,
    },

    /// Both sides agreed; `new_session_id` is about to start.
    RematchAccepted {
        session_id: SessionId,
        new_session_id: SessionId,
    },

    RematchDeclined { session_id: SessionId },

    /// Nobody answered the rematch request in time.
    RematchTimedOut { session_id: SessionId },

    QueueJoined { difficulty: Difficulty },

    QueueLeft,

    /// A request was refused. `code` is stable across releases.
    Error { code: u16, message: String },
}
