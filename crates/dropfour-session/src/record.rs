//! The record handed to the store when a game ends.

use serde::{Deserialize, Serialize};

use dropfour_protocol::{Board, EndReason, Outcome, PlayerId, PlayerInfo, SessionId};

/// Everything worth keeping about a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedGame {
    pub session_id: SessionId,
    /// Indexed by seat: `[first, second]`. A bot appears under
    /// [`PlayerId::BOT`].
    pub seats: [PlayerInfo; 2],
    pub outcome: Outcome,
    pub winner: Option<PlayerId>,
    pub end_reason: EndReason,
    pub move_count: u32,
    pub duration_secs: u64,
    pub final_board: Board,
}
