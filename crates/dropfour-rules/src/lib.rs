//! Board and rules engine for dropfour.
//!
//! Everything in this crate is pure and deterministic: a fixed 6x7 grid,
//! gravity-based placement, and point-local win detection. Higher layers
//! (the bot engine, game sessions) build on these primitives and never
//! mutate a board any other way.
//!
//! # Key types
//!
//! - [`Board`]: the grid, with legality checks and win detection
//! - [`Game`]: one match: board + whose turn + status
//! - [`Seat`]: first or second mover, independent of player identity
//! - [`RulesError`]: why a move was refused

mod board;
mod error;
mod game;

pub use board::{Board, Cell, Seat, CENTER_COLUMN, COLS, DIRECTIONS, ROWS, WIN_LENGTH};
pub use error::{MoveRejection, RulesError};
pub use game::{Game, GameStatus, MoveOutcome};
