//! Game session lifecycle for dropfour.
//!
//! A session is one match between two seats plus whatever happens after
//! it ends: the post-game window, rematch negotiation, and teardown.
//!
//! ```text
//! SessionManager ──owns──→ SessionRegistry ──indexes──→ GameSession
//!       │                                                   │
//!       ├── Notifier  (events to players)                   └── Mutex<SessionState>
//!       └── GameStore (finished games)                            ├── Game
//!                                                                 └── timers
//! ```
//!
//! Every mutation of a session happens under that session's lock, timer
//! callbacks included. The registry has its own lock and may be taken
//! while a session lock is held, never the reverse.

mod collaborator;
mod config;
mod error;
mod manager;
mod record;
mod registry;
mod session;

pub use collaborator::{GameStore, MemoryStore, Notifier, NoopStore};
pub use config::SessionConfig;
pub use error::{PersistenceFailure, SessionError};
pub use manager::{RematchProgress, SessionManager};
pub use record::FinishedGame;
pub use registry::SessionRegistry;
pub use session::{CloseReason, GameSession, SessionPhase, SessionSnapshot, SessionState};
