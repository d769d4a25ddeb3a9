//! Service-wide configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use dropfour_lobby::QueueConfig;
use dropfour_session::SessionConfig;

/// Everything [`GameService`](crate::GameService) can be tuned with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub session: SessionConfig,
    pub queue: QueueConfig,
    /// How often stale sessions are swept.
    pub sweep_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            queue: QueueConfig::default(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
