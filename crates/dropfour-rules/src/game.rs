//! A single match: one board, whose turn it is, and how it ended.

use serde::{Deserialize, Serialize};

use crate::{Board, MoveRejection, RulesError, Seat};

/// Lifecycle of a [`Game`].
///
/// ```text
/// Active ──(winning move)──→ Won
///    └────(board filled)───→ Draw
/// ```
///
/// `Won` and `Draw` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Won,
    Draw,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// What a successful move did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub seat: Seat,
    pub column: usize,
    pub row: usize,
    /// Game status after the move.
    pub status: GameStatus,
    /// Whose turn it is now; `None` once the game is over.
    pub next_turn: Option<Seat>,
}

/// One connect-four match.
///
/// Starts Active on an empty board with [`Seat::First`] to move. The only
/// way to change it is [`Game::apply_move`]; once the status leaves
/// `Active` every further move is refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    current: Seat,
    status: GameStatus,
    winner: Option<Seat>,
    move_count: u32,
}

impl Game {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            current: Seat::First,
            status: GameStatus::Active,
            winner: None,
            move_count: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The seat to move. Frozen once the game is terminal.
    pub fn current_turn(&self) -> Seat {
        self.current
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Set only when the status is `Won`.
    pub fn winner(&self) -> Option<Seat> {
        self.winner
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Drops the current seat's piece into `column`.
    ///
    /// On success the move count goes up by one and, unless the move ended
    /// the game, the turn passes to the other seat.
    ///
    /// # Errors
    /// - [`MoveRejection::GameOver`] once the game is terminal
    /// - [`MoveRejection::ColumnOutOfRange`] / [`RulesError::ColumnFull`]
    ///   from the board
    pub fn apply_move(&mut self, column: usize) -> Result<MoveOutcome, RulesError> {
        if self.is_terminal() {
            return Err(MoveRejection::GameOver.into());
        }

        let seat = self.current;
        let row = self.board.apply_move(column, seat)?;
        self.move_count += 1;

        if self.board.check_win(row, column, seat) {
            self.status = GameStatus::Won;
            self.winner = Some(seat);
        } else if self.board.is_full() {
            self.status = GameStatus::Draw;
        } else {
            self.current = seat.other();
        }

        Ok(MoveOutcome {
            seat,
            column,
            row,
            status: self.status,
            next_turn: (!self.is_terminal()).then_some(self.current),
        })
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_is_active_with_first_to_move() {
        let game = Game::new();
        assert_eq!(game.status(), GameStatus::Active);
        assert_eq!(game.current_turn(), Seat::First);
        assert_eq!(game.winner(), None);
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_apply_move_alternates_turns() {
        let mut game = Game::new();
        let out = game.apply_move(0).unwrap();
        assert_eq!(out.seat, Seat::First);
        assert_eq!(out.next_turn, Some(Seat::Second));
        assert_eq!(game.current_turn(), Seat::Second);

        let out = game.apply_move(0).unwrap();
        assert_eq!(out.seat, Seat::Second);
        assert_eq!(out.row, 4);
        assert_eq!(game.current_turn(), Seat::First);
        assert_eq!(game.move_count(), 2);
    }

    #[test]
    fn test_apply_move_rejected_leaves_game_untouched() {
        let mut game = Game::new();
        game.apply_move(1).unwrap();
        let before = game.clone();

        assert!(game.apply_move(42).is_err());
        assert_eq!(game, before);
    }

    #[test]
    fn test_apply_move_after_win_is_game_over() {
        let mut game = Game::new();
        for _ in 0..3 {
            game.apply_move(0).unwrap();
            game.apply_move(1).unwrap();
        }
        let out = game.apply_move(0).unwrap();
        assert_eq!(out.status, GameStatus::Won);
        assert_eq!(out.next_turn, None);
        assert_eq!(game.winner(), Some(Seat::First));

        let before = game.clone();
        assert_eq!(
            game.apply_move(2),
            Err(RulesError::InvalidMove(MoveRejection::GameOver))
        );
        assert_eq!(game, before);
    }
}
