use std::collections::HashMap;

use serde::Deserialize;

use super::defaults::DEFAULT_EXECUTOR_TIMEOUT_MS;
use super::error::ConfigError;
use super::loader::expand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Run built-in packages in-process.
    #[default]
    Local,
    /// Forward executions to a sandbox service.
    Remote,
}

/// Package executor settings from `[executor]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub kind: ExecutorKind,
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    /// Environment forwarded with every execution.
    pub env: HashMap<String, String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::Local,
            endpoint: None,
            timeout_ms: DEFAULT_EXECUTOR_TIMEOUT_MS,
            env: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawExecutorConfig {
    #[serde(default)]
    kind: ExecutorKind,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default)]
    env: HashMap<String, String>,
}

impl Default for RawExecutorConfig {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::Local,
            endpoint: None,
            timeout_ms: DEFAULT_EXECUTOR_TIMEOUT_MS,
            env: HashMap::new(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_EXECUTOR_TIMEOUT_MS
}

impl TryFrom<RawExecutorConfig> for ExecutorConfig {
    type Error = ConfigError;

    fn try_from(raw: RawExecutorConfig) -> Result<Self, Self::Error> {
        if raw.timeout_ms == 0 {
            return Err(ConfigError::InvalidExecutorTimeout);
        }
        let endpoint = raw
            .endpoint
            .map(|e| expand(&e))
            .filter(|e| !e.trim().is_empty());
        if raw.kind == ExecutorKind::Remote && endpoint.is_none() {
            return Err(ConfigError::MissingExecutorEndpoint);
        }
        Ok(Self {
            kind: raw.kind,
            endpoint,
            timeout_ms: raw.timeout_ms,
            env: raw
                .env
                .into_iter()
                .map(|(key, value)| (key, expand(&value)))
                .collect(),
        })
    }
}
