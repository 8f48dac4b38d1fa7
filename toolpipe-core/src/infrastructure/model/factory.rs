//! Provider factory - creates clients from config

use std::env;

use tracing::warn;

use super::clients::OpenAIClient;
use super::traits::ModelClient;
use crate::config::ModelProviderConfig;

/// Resolve API key from environment variable
pub fn resolve_api_key(provider: &str, spec: Option<&str>) -> Option<String> {
    let raw = spec.map(str::trim)?;
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating model clients from provider config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates a model client based on provider type.
    ///
    /// - `ollama` → chat-completions without authentication
    /// - anything else → OpenAI-compatible with bearer auth
    pub fn create(config: &ModelProviderConfig) -> Box<dyn ModelClient> {
        Box::new(OpenAIClient::from_config(config))
    }
}
