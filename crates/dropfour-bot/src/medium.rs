//! Medium tier: hand-tuned weighted scoring of every legal column.
//!
//! The weights are tunables. What matters is their ordering: winning now
//! beats blocking, blocking beats any threat, and an unblockable threat
//! beats a single blockable one.

use dropfour_rules::{Board, Seat, COLS, DIRECTIONS};

use crate::threat::{line_run, threat_score, winning_columns};
use crate::CENTER_OUT;

const WIN_NOW: i32 = 1_000_000;
const BLOCK_LOSS: i32 = 500_000;

/// Points for a run through the landing cell that still has room to grow.
const RUN_OF_THREE: i32 = 50;
const RUN_OF_TWO: i32 = 10;
const RUN_OF_ONE: i32 = 1;

/// Center column best, edges worst.
const POSITION: [i32; 7] = [0, 10, 20, 30, 20, 10, 0];

/// Picks the highest scoring column. Ties go to the column closest to the
/// center, the center itself first.
pub(crate) fn choose(board: &Board, bot: Seat) -> Option<usize> {
    let opponent = bot.other();
    let opponent_wins = winning_columns(board, opponent);
    let opponent_threat = threat_score(board, opponent);

    let mut scores = [None; COLS];
    for (col, slot) in scores.iter_mut().enumerate() {
        let Some((after, row)) = board.with_move(col, bot) else {
            continue;
        };
        *slot = Some(score_column(
            board,
            &after,
            row,
            col,
            bot,
            &opponent_wins,
            opponent_threat,
        ));
    }
    best_column(&scores)
}

/// Highest score wins. On equal scores the earlier column in
/// center-out order is kept.
fn best_column(scores: &[Option<i32>; COLS]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for col in CENTER_OUT {
        let Some(score) = scores[col] else {
            continue;
        };
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((col, score));
        }
    }
    best.map(|(col, _)| col)
}

fn score_column(
    before: &Board,
    after: &Board,
    row: usize,
    col: usize,
    bot: Seat,
    opponent_wins: &[usize],
    opponent_threat: i32,
) -> i32 {
    let opponent = bot.other();
    let mut score = 0;

    if after.check_win(row, col, bot) {
        score += WIN_NOW;
    }
    if opponent_wins.contains(&col) {
        score += BLOCK_LOSS;
    }

    score += threat_score(after, bot);

    let remaining = threat_score(after, opponent);
    if remaining < opponent_threat {
        score += opponent_threat - remaining;
    }

    score += local_runs(after, row, col, bot);
    if let Some((mirrored, _)) = before.with_move(col, opponent) {
        score += local_runs(&mirrored, row, col, opponent) / 2;
    }

    score + POSITION[col]
}

/// Sums run points over the four lines through `(row, col)`.
fn local_runs(board: &Board, row: usize, col: usize, seat: Seat) -> i32 {
    DIRECTIONS
        .iter()
        .map(|&(dr, dc)| match line_run(board, row, col, dr, dc, seat) {
            (_, false) => 0,
            (run, true) if run >= 3 => RUN_OF_THREE,
            (2, true) => RUN_OF_TWO,
            (_, true) => RUN_OF_ONE,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medium_opens_in_center() {
        assert_eq!(choose(&Board::new(), Seat::First), Some(3));
    }

    #[test]
    fn test_medium_takes_win_over_block() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.apply_move(6, Seat::Second).unwrap();
            board.apply_move(0, Seat::First).unwrap();
        }
        assert_eq!(choose(&board, Seat::First), Some(0));
    }

    #[test]
    fn test_medium_blocks_vertical_three() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.apply_move(5, Seat::First).unwrap();
        }
        board.apply_move(0, Seat::Second).unwrap();
        board.apply_move(1, Seat::Second).unwrap();
        assert_eq!(choose(&board, Seat::Second), Some(5));
    }

    #[test]
    fn test_medium_prevents_open_three() {
        // First has two adjacent pieces in the middle of the bottom row.
        // Letting a third join would leave two winning ends.
        let mut board = Board::new();
        board.apply_move(2, Seat::First).unwrap();
        board.apply_move(3, Seat::First).unwrap();
        board.apply_move(3, Seat::Second).unwrap();
        let col = choose(&board, Seat::Second).unwrap();
        assert!(col == 1 || col == 4, "expected to cap the pair, got {col}");
    }

    #[test]
    fn test_medium_returns_none_on_full_board() {
        let mut board = Board::new();
        let mut seat = Seat::First;
        for col in 0..7 {
            for _ in 0..6 {
                board.apply_move(col, seat).unwrap();
                seat = seat.other();
            }
        }
        assert_eq!(choose(&board, Seat::First), None);
    }

    #[test]
    fn test_medium_builds_double_threat() {
        // First holds columns 2 and 3 on the bottom row with both ends open.
        // Extending right leaves two winning columns at once.
        let mut board = Board::new();
        board.apply_move(2, Seat::First).unwrap();
        board.apply_move(3, Seat::First).unwrap();

        let col = choose(&board, Seat::First).unwrap();
        assert_eq!(col, 4);

        let (after, _) = board.with_move(col, Seat::First).unwrap();
        assert_eq!(winning_columns(&after, Seat::First), vec![1, 5]);
    }

    #[test]
    fn test_medium_center_full_picks_left_of_center() {
        // The center column is full and the position is mirror symmetric,
        // so columns 2 and 4 tie and the left one comes first.
        let mut board = Board::new();
        let mut seat = Seat::First;
        for _ in 0..6 {
            board.apply_move(3, seat).unwrap();
            seat = seat.other();
        }
        assert!(!board.is_legal_move(3));

        assert_eq!(choose(&board, Seat::First), Some(2));
        assert_eq!(choose(&board, Seat::Second), Some(2));
    }

    #[test]
    fn test_best_column_tie_prefers_center() {
        let mut scores = [Some(0); COLS];
        scores[1] = Some(40);
        scores[4] = Some(40);
        assert_eq!(best_column(&scores), Some(4));
    }

    #[test]
    fn test_best_column_edge_tie_prefers_left() {
        let scores = [Some(7), None, None, None, None, None, Some(7)];
        assert_eq!(best_column(&scores), Some(0));
    }

    #[test]
    fn test_best_column_all_full_is_none() {
        assert_eq!(best_column(&[None; COLS]), None);
    }
}
