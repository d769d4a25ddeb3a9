//! # Dropfour
//!
//! Real-time connect-four game service.
//!
//! Dropfour pairs players through a FIFO matchmaking queue, falls back to a
//! bot when nobody else shows up, runs each game as a server-authoritative
//! session, and handles the post-game window and rematch negotiation. The
//! transport layer only has to turn client messages into [`GameService`]
//! calls and deliver [`GameEvent`](protocol::GameEvent)s back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dropfour::prelude::*;
//!
//! # async fn run() -> Result<(), DropFourError> {
//! let notifier = Arc::new(ChannelNotifier::new());
//! let service = GameServiceBuilder::new().build(Arc::clone(&notifier), NoopStore);
//!
//! let mut events = notifier.register(PlayerId(1));
//! service
//!     .request_match(PlayerInfo::new(PlayerId(1), "ann"), Difficulty::Hard)
//!     .await?;
//! while let Some(Outbound::Event(event)) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod notifier;
mod service;

pub use config::ServiceConfig;
pub use error::DropFourError;
pub use notifier::{ChannelNotifier, Outbound, PlayerSender};
pub use service::{GameService, GameServiceBuilder};

pub use dropfour_bot as bot;
pub use dropfour_lobby as lobby;
pub use dropfour_protocol as protocol;
pub use dropfour_rules as rules;
pub use dropfour_session as session;

pub mod prelude {
    pub use crate::{
        ChannelNotifier, DropFourError, GameService, GameServiceBuilder, Outbound, ServiceConfig,
    };
    pub use dropfour_lobby::{EnqueueOutcome, QueueConfig};
    pub use dropfour_protocol::{
        Board, Difficulty, EndReason, GameEvent, Opponent, Outcome, PlayerId, PlayerInfo,
        RematchDecision, Seat, SessionId,
    };
    pub use dropfour_rules::MoveOutcome;
    pub use dropfour_session::{
        GameStore, MemoryStore, Notifier, NoopStore, RematchProgress, SessionConfig,
    };
}
