//! Easy tier: one ply of lookahead.

use dropfour_rules::{Board, Seat};
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::threat::winning_columns;

/// Plays an immediate win, else blocks an immediate loss, else picks a
/// legal column uniformly at random.
pub(crate) fn choose<R: Rng + ?Sized>(board: &Board, bot: Seat, rng: &mut R) -> Option<usize> {
    if let Some(&col) = winning_columns(board, bot).first() {
        return Some(col);
    }
    if let Some(&col) = winning_columns(board, bot.other()).first() {
        return Some(col);
    }
    let legal: Vec<usize> = board.legal_columns().collect();
    legal.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_easy_prefers_win_over_block() {
        let mut board = Board::new();
        // Second has three stacked in column 0, First three stacked in column 6.
        for _ in 0..3 {
            board.apply_move(6, Seat::First).unwrap();
            board.apply_move(0, Seat::Second).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(choose(&board, Seat::Second, &mut rng), Some(0));
        assert_eq!(choose(&board, Seat::First, &mut rng), Some(6));
    }

    #[test]
    fn test_easy_blocks_when_it_cannot_win() {
        let mut board = Board::new();
        for col in 1..4 {
            board.apply_move(col, Seat::First).unwrap();
        }
        board.apply_move(6, Seat::Second).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let col = choose(&board, Seat::Second, &mut rng).unwrap();
        assert!(col == 0 || col == 4, "must block the open three, got {col}");
    }

    #[test]
    fn test_easy_random_choice_is_legal() {
        let mut board = Board::new();
        let mut seat = Seat::First;
        for _ in 0..6 {
            board.apply_move(3, seat).unwrap();
            seat = seat.other();
        }
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let col = choose(&board, Seat::Second, &mut rng).unwrap();
            assert!(board.is_legal_move(col));
        }
    }
}
