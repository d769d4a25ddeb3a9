//! Session timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timers and retention limits for game sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a finished session stays open for a rematch request.
    pub post_game_window: Duration,

    /// How long the opponent has to answer a rematch request.
    pub rematch_response_window: Duration,

    /// Pause before the bot replies, so its moves don't look instantaneous.
    pub bot_move_delay: Duration,

    /// The sweep drops finished sessions older than this.
    pub finished_retention: Duration,

    /// The sweep drops active sessions older than this.
    pub max_active_age: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            post_game_window: Duration::from_secs(30),
            rematch_response_window: Duration::from_secs(10),
            bot_move_delay: Duration::from_millis(600),
            finished_retention: Duration::from_secs(5 * 60),
            max_active_age: Duration::from_secs(2 * 60 * 60),
        }
    }
}
