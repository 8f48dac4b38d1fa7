use std::path::{Path, PathBuf};

use super::agent::AgentConfig;
use super::error::ConfigError;
use super::executor::ExecutorConfig;
use super::pricing::Pricing;
use super::provider::ModelProviderConfig;
use super::rate_limit::RateLimitConfig;
use super::server::ServerConfig;

/// Application configuration loaded from toolpipe.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub providers: Vec<ModelProviderConfig>,
    pub agent: AgentConfig,
    pub executor: ExecutorConfig,
    pub pricing: Pricing,
    pub rate_limit: RateLimitConfig,
    /// Optional catalog file with externally hosted packages
    pub catalog: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Parse configuration from TOML text; `origin` is only used in errors.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        super::loader::parse_config(content, origin)
    }

    pub fn provider(&self, id: &str) -> Option<&ModelProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }
}
