use std::net::SocketAddr;

use serde::Deserialize;

use super::defaults::DEFAULT_BIND;
use super::error::ConfigError;

/// REST/SSE server settings from `[server]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct RawServerConfig {
    #[serde(default)]
    bind: Option<String>,
    #[serde(default)]
    cors_origins: Vec<String>,
}

impl TryFrom<RawServerConfig> for ServerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawServerConfig) -> Result<Self, Self::Error> {
        let value = raw.bind.unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBind { value })?;
        Ok(Self {
            bind,
            cors_origins: raw.cors_origins,
        })
    }
}
