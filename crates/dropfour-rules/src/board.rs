//! The 6x7 grid and the pure rule functions over it.
//!
//! Row 0 is the top of the board, row 5 the bottom. Pieces fall to the
//! lowest empty row of a column, so a cell is only ever occupied when every
//! cell below it in the same column is occupied too.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MoveRejection, RulesError};

/// Number of rows on the board.
pub const ROWS: usize = 6;

/// Number of columns on the board.
pub const COLS: usize = 7;

/// Pieces in a line needed to win.
pub const WIN_LENGTH: usize = 4;

/// The middle column, favored by every bot tier.
pub const CENTER_COLUMN: usize = COLS / 2;

/// The four line directions as `(delta_row, delta_col)`: horizontal,
/// vertical, and the two diagonals. Each line is walked both ways.
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

// ---------------------------------------------------------------------------
// Seat / Cell
// ---------------------------------------------------------------------------

/// A player's logical position within one game.
///
/// `First` always moves first. Seats say nothing about who the player is;
/// the session layer maps player identities onto seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// The cell value this seat's pieces occupy.
    pub fn cell(self) -> Cell {
        match self {
            Self::First => Cell::PlayerA,
            Self::Second => Cell::PlayerB,
        }
    }

    /// Index into two-element per-seat arrays.
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

/// The content of one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    PlayerA,
    PlayerB,
}

impl Cell {
    /// The seat owning this cell, or `None` when empty.
    pub fn seat(self) -> Option<Seat> {
        match self {
            Self::Empty => None,
            Self::PlayerA => Some(Seat::First),
            Self::PlayerB => Some(Seat::Second),
        }
    }

    fn symbol(self) -> char {
        match self {
            Self::Empty => '.',
            Self::PlayerA => 'X',
            Self::PlayerB => 'O',
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A fixed 6x7 connect-four grid.
///
/// `Board` is `Copy`: the bot engine simulates moves on copies and the real
/// board is never touched outside [`Game::apply_move`](crate::Game::apply_move).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell at `(row, col)`. Row 0 is the top.
    ///
    /// # Panics
    /// Panics if `row >= ROWS` or `col >= COLS`.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Returns the cell at a signed position, or `None` off the board.
    pub fn get_signed(&self, row: isize, col: isize) -> Option<Cell> {
        if row < 0 || col < 0 || row >= ROWS as isize || col >= COLS as isize {
            return None;
        }
        Some(self.cells[row as usize][col as usize])
    }

    /// Returns all rows, top first.
    pub fn rows(&self) -> &[[Cell; COLS]; ROWS] {
        &self.cells
    }

    /// `true` iff `col` is on the board and its top cell is empty.
    pub fn is_legal_move(&self, col: usize) -> bool {
        col < COLS && self.cells[0][col] == Cell::Empty
    }

    /// Iterates the columns that can still take a piece, left to right.
    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..COLS).filter(|&col| self.is_legal_move(col))
    }

    /// The row a piece dropped into `col` would land on, if any.
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        (0..ROWS).rev().find(|&row| self.cells[row][col] == Cell::Empty)
    }

    /// Drops a piece for `seat` into `col` and returns the landing row.
    ///
    /// Scans the column bottom-up for the first empty cell.
    ///
    /// # Errors
    /// - [`RulesError::InvalidMove`] if `col` is out of range
    /// - [`RulesError::ColumnFull`] if the column has no empty cell
    pub fn apply_move(&mut self, col: usize, seat: Seat) -> Result<usize, RulesError> {
        if col >= COLS {
            return Err(MoveRejection::ColumnOutOfRange(col).into());
        }
        let row = self.landing_row(col).ok_or(RulesError::ColumnFull(col))?;
        self.cells[row][col] = seat.cell();
        Ok(row)
    }

    /// Returns a copy of the board with `seat`'s piece dropped into `col`,
    /// plus the landing row. `None` if the move is not legal.
    pub fn with_move(&self, col: usize, seat: Seat) -> Option<(Board, usize)> {
        let mut next = *self;
        let row = next.apply_move(col, seat).ok()?;
        Some((next, row))
    }

    /// `true` iff a line of [`WIN_LENGTH`] or more `seat` pieces passes
    /// through `(row, col)`.
    ///
    /// Only the four lines through that point are examined. This is called
    /// after every placement and at every node of the bot's search, so it
    /// deliberately avoids a full-board scan.
    pub fn check_win(&self, row: usize, col: usize, seat: Seat) -> bool {
        if row >= ROWS || col >= COLS || self.cells[row][col] != seat.cell() {
            return false;
        }
        DIRECTIONS.iter().any(|&(dr, dc)| {
            let run = 1
                + self.count_consecutive(row, col, dr, dc, seat)
                + self.count_consecutive(row, col, -dr, -dc, seat);
            run >= WIN_LENGTH
        })
    }

    /// `true` iff the top row has no empty cell.
    pub fn is_full(&self) -> bool {
        self.cells[0].iter().all(|&cell| cell != Cell::Empty)
    }

    /// Counts consecutive `seat` pieces strictly beyond `(row, col)` in the
    /// direction `(delta_row, delta_col)`. The starting cell is not counted.
    pub fn count_consecutive(
        &self,
        row: usize,
        col: usize,
        delta_row: isize,
        delta_col: isize,
        seat: Seat,
    ) -> usize {
        let target = seat.cell();
        let mut r = row as isize + delta_row;
        let mut c = col as isize + delta_col;
        let mut count = 0;
        while self.get_signed(r, c) == Some(target) {
            count += 1;
            r += delta_row;
            c += delta_col;
        }
        count
    }

    /// `true` iff a piece could eventually sit at `(row, col)`: the cell is
    /// on the board, empty, and either on the bottom row or resting on an
    /// occupied cell.
    pub fn is_playable_cell(&self, row: isize, col: isize) -> bool {
        if self.get_signed(row, col) != Some(Cell::Empty) {
            return false;
        }
        row == ROWS as isize - 1 || self.get_signed(row + 1, col) != Some(Cell::Empty)
    }

    /// Number of occupied cells.
    pub fn piece_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&cell| cell != Cell::Empty)
            .count()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().iter().enumerate() {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            if i + 1 < ROWS {
                writeln!(f, "{line}")?;
            } else {
                write!(f, "{line}")?;
            }
        }
        Ok(())
    }
}
