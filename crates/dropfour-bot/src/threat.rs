//! Threat detection shared by the bot tiers.

use dropfour_rules::{Board, Seat};

/// Score for a position where `seat` has two or more immediate wins.
pub(crate) const UNBLOCKABLE_THREAT: i32 = 10_000;

/// Legal columns in which `seat` would connect four right now.
pub fn winning_columns(board: &Board, seat: Seat) -> Vec<usize> {
    board
        .legal_columns()
        .filter(|&col| {
            board
                .with_move(col, seat)
                .is_some_and(|(next, row)| next.check_win(row, col, seat))
        })
        .collect()
}

/// How dangerous `seat`'s immediate-win threats are on `board`.
///
/// - two or more winning columns: the other side cannot block them all
/// - exactly one: the other side blocks it; worth half if `seat` then still
///   has a winning reply (usually the cell right above the block), a
///   quarter otherwise
/// - none: zero
pub(crate) fn threat_score(board: &Board, seat: Seat) -> i32 {
    let wins = winning_columns(board, seat);
    match wins.as_slice() {
        [] => 0,
        [col] => {
            let follow_up = board
                .with_move(*col, seat.other())
                .is_some_and(|(blocked, _)| !winning_columns(&blocked, seat).is_empty());
            if follow_up {
                UNBLOCKABLE_THREAT / 2
            } else {
                UNBLOCKABLE_THREAT / 4
            }
        }
        _ => UNBLOCKABLE_THREAT,
    }
}

/// Length of the `seat` run through `(row, col)` along `(dr, dc)`, counting
/// the cell itself, and whether it has room to grow at either end.
///
/// An end has room only if the next cell past it is empty and a piece
/// could actually land there (bottom row, or something underneath).
pub(crate) fn line_run(
    board: &Board,
    row: usize,
    col: usize,
    dr: isize,
    dc: isize,
    seat: Seat,
) -> (usize, bool) {
    let forward = board.count_consecutive(row, col, dr, dc, seat);
    let backward = board.count_consecutive(row, col, -dr, -dc, seat);
    let (r, c) = (row as isize, col as isize);
    let ahead = (r + dr * (forward as isize + 1), c + dc * (forward as isize + 1));
    let behind = (r - dr * (backward as isize + 1), c - dc * (backward as isize + 1));
    let open =
        board.is_playable_cell(ahead.0, ahead.1) || board.is_playable_cell(behind.0, behind.1);
    (1 + forward + backward, open)
}
