use std::time::Duration;

use serde::Deserialize;

use super::defaults::{DEFAULT_MAX_EXECUTIONS, DEFAULT_WINDOW_SECS};
use super::error::ConfigError;

/// Fixed-window limit on tool executions per client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_executions")]
    pub max_executions: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_executions: DEFAULT_MAX_EXECUTIONS,
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

fn default_max_executions() -> u32 {
    DEFAULT_MAX_EXECUTIONS
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub(super) fn validated(self) -> Result<Self, ConfigError> {
        if self.max_executions == 0 || self.window_secs == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }
        Ok(self)
    }
}
