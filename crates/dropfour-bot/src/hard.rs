//! Hard tier: depth-limited minimax with alpha-beta pruning.

use dropfour_rules::{Board, Seat, CENTER_COLUMN, COLS, DIRECTIONS, ROWS};

use crate::threat::{line_run, winning_columns};
use crate::CENTER_OUT;

/// Plies searched by the Hard tier, counting the bot's own move.
pub const SEARCH_DEPTH: u32 = 7;

/// Base score of a forced win. Faster wins score higher.
const WIN_SCORE: i32 = 1_000_000;

/// Static evaluator weights.
const CELL_WEIGHT: i32 = 1;
const CENTER_WEIGHT: i32 = 3;
const OPEN_TWO: i32 = 4;
const OPEN_THREE: i32 = 16;

pub(crate) fn choose(board: &Board, bot: Seat) -> Option<usize> {
    if let Some(&col) = winning_columns(board, bot).first() {
        return Some(col);
    }
    search(board, bot, SEARCH_DEPTH, true).map(|(col, _)| col)
}

/// Searches `depth` plies ahead for `bot` and returns the best column with
/// its minimax score.
///
/// `prune` switches alpha-beta cutoffs on or off. Both settings return the
/// same column and score; pruning only skips subtrees that cannot change
/// the result.
pub fn search(board: &Board, bot: Seat, depth: u32, prune: bool) -> Option<(usize, i32)> {
    let depth = depth.max(1);
    let mut alpha = i32::MIN;
    let beta = i32::MAX;
    let mut best: Option<(usize, i32)> = None;

    for col in CENTER_OUT {
        let Some((child, row)) = board.with_move(col, bot) else {
            continue;
        };
        let score = if child.check_win(row, col, bot) {
            WIN_SCORE - 1
        } else {
            minimax(&child, depth - 1, 1, alpha, beta, false, bot, prune)
        };
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((col, score));
        }
        if prune {
            alpha = alpha.max(score);
        }
    }

    if let Some((column, score)) = best {
        tracing::trace!(column, score, depth, "minimax search finished");
    }
    best
}

#[allow(clippy::too_many_arguments)]
fn minimax(
    board: &Board,
    depth: u32,
    ply: i32,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    bot: Seat,
    prune: bool,
) -> i32 {
    if depth == 0 {
        return evaluate(board, bot);
    }

    let mover = if maximizing { bot } else { bot.other() };
    let mut value = if maximizing { i32::MIN } else { i32::MAX };
    let mut searched = false;

    for col in CENTER_OUT {
        let Some((child, row)) = board.with_move(col, mover) else {
            continue;
        };
        searched = true;

        let score = if child.check_win(row, col, mover) {
            if maximizing {
                WIN_SCORE - (ply + 1)
            } else {
                -WIN_SCORE + (ply + 1)
            }
        } else {
            minimax(&child, depth - 1, ply + 1, alpha, beta, !maximizing, bot, prune)
        };

        if maximizing {
            value = value.max(score);
            if prune {
                alpha = alpha.max(value);
                if alpha >= beta {
                    break;
                }
            }
        } else {
            value = value.min(score);
            if prune {
                beta = beta.min(value);
                if beta <= alpha {
                    break;
                }
            }
        }
    }

    if !searched {
        return evaluate(board, bot);
    }
    value
}

/// Static score of `board` from `bot`'s point of view.
///
/// Every occupied cell is worth a flat weight, more in the center column,
/// plus a bonus for each open run of two or three it belongs to. Opponent
/// cells count the same amount negatively.
pub(crate) fn evaluate(board: &Board, bot: Seat) -> i32 {
    let mut score = 0;
    for row in 0..ROWS {
        for col in 0..COLS {
            let Some(owner) = board.get(row, col).seat() else {
                continue;
            };
            let mut cell = CELL_WEIGHT;
            if col == CENTER_COLUMN {
                cell += CENTER_WEIGHT;
            }
            for &(dr, dc) in &DIRECTIONS {
                cell += match line_run(board, row, col, dr, dc, owner) {
                    (2, true) => OPEN_TWO,
                    (3, true) => OPEN_THREE,
                    _ => 0,
                };
            }
            score += if owner == bot { cell } else { -cell };
        }
    }
    score
}
