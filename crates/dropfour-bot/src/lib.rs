//! Bot decision engine for dropfour.
//!
//! [`select_move`] picks a column for the bot's seat at one of three
//! difficulty tiers:
//!
//! - **Easy**: win now, else block, else a random legal column
//! - **Medium**: weighted scoring of every column (threats, blocks,
//!   run-building, center preference)
//! - **Hard**: 7-ply minimax with alpha-beta pruning over a static
//!   evaluator
//!
//! Every tier treats the board as read-only and simulates moves on copies.
//! The search is pure CPU work with no I/O, so callers run it inline.

mod easy;
mod hard;
mod medium;
mod threat;

use dropfour_protocol::Difficulty;
use dropfour_rules::{Board, Seat};
use rand::Rng;

pub use hard::{search, SEARCH_DEPTH};
pub use threat::winning_columns;

/// Picks a column for `bot` to play, or `None` when the board has no legal
/// column left.
pub fn select_move(board: &Board, bot: Seat, difficulty: Difficulty) -> Option<usize> {
    select_move_with_rng(board, bot, difficulty, &mut rand::rng())
}

/// Same as [`select_move`] with a caller-supplied random source. Only the
/// Easy tier draws from it.
pub fn select_move_with_rng<R: Rng + ?Sized>(
    board: &Board,
    bot: Seat,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<usize> {
    if board.legal_columns().next().is_none() {
        return None;
    }
    let column = match difficulty {
        Difficulty::Easy => easy::choose(board, bot, rng),
        Difficulty::Medium => medium::choose(board, bot),
        Difficulty::Hard => hard::choose(board, bot),
    };
    tracing::trace!(%difficulty, %bot, ?column, "bot selected move");
    column
}

/// Columns ordered center-out. Used for search move ordering and for
/// breaking ties in favor of the center.
pub(crate) const CENTER_OUT: [usize; 7] = [3, 2, 4, 1, 5, 0, 6];
