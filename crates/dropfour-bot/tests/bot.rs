//! Behavioral tests for the bot decision engine across all tiers.

use dropfour_bot::{search, select_move, select_move_with_rng, winning_columns, SEARCH_DEPTH};
use dropfour_protocol::Difficulty;
use dropfour_rules::{Board, Seat, COLS, ROWS};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

// =========================================================================
// Helpers
// =========================================================================

const ALL_TIERS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

/// Plays `moves` alternately starting with `First`.
fn board_from(moves: &[usize]) -> Board {
    let mut board = Board::new();
    let mut seat = Seat::First;
    for &col in moves {
        board.apply_move(col, seat).unwrap();
        seat = seat.other();
    }
    board
}

/// Random positions reached without anyone winning yet, paired with the
/// seat to move.
fn random_positions(seed: u64, games: usize) -> Vec<(Board, Seat)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut positions = Vec::new();
    for _ in 0..games {
        let mut board = Board::new();
        let mut seat = Seat::First;
        loop {
            positions.push((board, seat));
            let legal: Vec<usize> = board.legal_columns().collect();
            let Some(&col) = legal.choose(&mut rng) else {
                break;
            };
            let row = board.apply_move(col, seat).unwrap();
            if board.check_win(row, col, seat) {
                break;
            }
            seat = seat.other();
        }
    }
    positions
}

// =========================================================================
// Immediate wins
// =========================================================================

#[test]
fn test_every_tier_takes_an_available_win() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut checked = 0;

    for (board, seat) in random_positions(42, 150) {
        let wins = winning_columns(&board, seat);
        if wins.is_empty() {
            continue;
        }
        for difficulty in ALL_TIERS {
            let col = select_move_with_rng(&board, seat, difficulty, &mut rng).unwrap();
            assert!(
                wins.contains(&col),
                "{difficulty} played {col}, winning columns {wins:?}\n{board}"
            );
        }
        checked += 1;
    }
    assert!(checked > 20, "too few winning positions sampled ({checked})");
}

#[test]
fn test_no_move_on_full_board() {
    let mut board = Board::new();
    let mut seat = Seat::First;
    for col in 0..COLS {
        for _ in 0..ROWS {
            board.apply_move(col, seat).unwrap();
            seat = seat.other();
        }
    }
    for difficulty in ALL_TIERS {
        assert_eq!(select_move(&board, Seat::First, difficulty), None);
    }
}

#[test]
fn test_selected_column_is_always_legal() {
    let mut rng = StdRng::seed_from_u64(5);
    for (board, seat) in random_positions(9, 20) {
        if board.legal_columns().next().is_none() {
            continue;
        }
        for difficulty in [Difficulty::Easy, Difficulty::Medium] {
            let col = select_move_with_rng(&board, seat, difficulty, &mut rng).unwrap();
            assert!(board.is_legal_move(col));
        }
    }
}

#[test]
fn test_selection_leaves_board_untouched() {
    let board = board_from(&[3, 3, 2, 4]);
    let copy = board;
    for difficulty in ALL_TIERS {
        select_move(&board, Seat::First, difficulty);
    }
    assert_eq!(board, copy);
}

// =========================================================================
// Blocking
// =========================================================================

#[test]
fn test_medium_and_hard_block_a_single_threat() {
    // First has three on the bottom row with only column 0 open:
    // columns 1-3 are First, column 4 is Second.
    let board = board_from(&[1, 4, 2, 4, 3]);
    assert_eq!(winning_columns(&board, Seat::First), vec![0]);

    assert_eq!(select_move(&board, Seat::Second, Difficulty::Medium), Some(0));
    assert_eq!(select_move(&board, Seat::Second, Difficulty::Hard), Some(0));
}

// =========================================================================
// Alpha-beta vs plain minimax
// =========================================================================

#[test]
fn test_alpha_beta_matches_plain_minimax_mid_game() {
    let boards = [
        (board_from(&[3, 3, 2, 4]), Seat::First),
        (board_from(&[3, 2, 3, 3, 4, 1, 5]), Seat::Second),
        (board_from(&[0, 6, 1, 5, 2, 4, 3, 3]), Seat::First),
        (board_from(&[3, 3, 3, 3, 2, 4, 4, 2, 5]), Seat::Second),
        (board_from(&[1, 2, 3, 4, 5, 6, 0, 1, 2, 3]), Seat::First),
    ];
    for (board, seat) in boards {
        for depth in [3, 5] {
            let pruned = search(&board, seat, depth, true);
            let plain = search(&board, seat, depth, false);
            assert_eq!(pruned, plain, "depth {depth}\n{board}");
        }
    }
}

#[test]
fn test_alpha_beta_matches_plain_minimax_at_full_depth_late_game() {
    // Columns 0-3 are full, leaving three open columns for a cheap full
    // depth comparison.
    let board = board_from(&[
        0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, //
        2, 3, 2, 3, 2, 3, 3, 2, 3, 2, 3, 2, //
        4, 5,
    ]);
    assert_eq!(board.legal_columns().count(), 3);

    let pruned = search(&board, Seat::First, SEARCH_DEPTH, true);
    let plain = search(&board, Seat::First, SEARCH_DEPTH, false);
    assert!(pruned.is_some());
    assert_eq!(pruned, plain);
}

#[test]
fn test_hard_avoids_setting_up_a_loss() {
    // Bottom row: First owns 1 and 2, Second owns 5 and 6. First to move:
    // dropping in 3 gives First an open three (cols 0 and 4 both win).
    let board = board_from(&[1, 5, 2, 6]);
    assert_eq!(select_move(&board, Seat::First, Difficulty::Hard), Some(3));
}
