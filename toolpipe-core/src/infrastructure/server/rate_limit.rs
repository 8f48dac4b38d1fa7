//! Fixed-window execution limiter keyed by client.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitConfig;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_in: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    used: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Counts one execution for `key` unless its window is exhausted.
    pub async fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let length = self.config.window();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, window| now.duration_since(window.started) < length);

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            used: 0,
        });
        let reset_in = length.saturating_sub(now.duration_since(window.started));

        if window.used >= self.config.max_executions {
            debug!(client = key, "Rate limit exceeded");
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }
        window.used += 1;
        RateDecision {
            allowed: true,
            remaining: self.config.max_executions - window.used,
            reset_in,
        }
    }
}

/// First `X-Forwarded-For` entry, or `anonymous`.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}
