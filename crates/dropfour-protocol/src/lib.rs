//! Shared vocabulary for dropfour.
//!
//! This crate defines the types that cross layer boundaries:
//!
//! - **Identity** ([`PlayerId`], [`SessionId`], [`PlayerInfo`]): who is
//!   playing and in which session.
//! - **Match setup** ([`Difficulty`], [`Opponent`]): human or bot, and how
//!   strong the bot is.
//! - **Events** ([`GameEvent`]): everything the service tells a player.
//!   The transport layer decides how these are framed on the wire.
//!
//! ```text
//! Rules (Board, Seat) → Protocol (ids, events) → Session / Lobby
//! ```

mod error;
mod event;
mod types;

pub use dropfour_rules::{Board, Seat};
pub use error::ProtocolError;
pub use event::{EndReason, GameEvent, Outcome};
pub use types::{Difficulty, Opponent, PlayerId, PlayerInfo, RematchDecision, SessionId};
