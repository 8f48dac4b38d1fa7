use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required field 'agent.model' in configuration")]
    MissingModel,

    #[error("missing required field 'agent.default_provider' in configuration")]
    MissingDefaultProvider,

    #[error("no providers configured - at least one [[providers]] entry is required")]
    NoProvidersConfigured,

    #[error("default provider '{provider}' not found in configured providers")]
    ProviderNotFound { provider: String },

    #[error("provider '{provider}' is missing required field 'endpoint'")]
    MissingEndpoint { provider: String },

    #[error("provider '{provider}' has unsupported type '{provider_type}' (expected 'openai' or 'ollama')")]
    UnsupportedProviderType {
        provider: String,
        provider_type: String,
    },

    #[error("invalid server bind address '{value}'")]
    InvalidBind { value: String },

    #[error("'agent.max_steps' must be at least 1")]
    InvalidMaxSteps,

    #[error("remote executor requires 'executor.endpoint'")]
    MissingExecutorEndpoint,

    #[error("'executor.timeout_ms' must be greater than 0")]
    InvalidExecutorTimeout,

    #[error("pricing values must be finite and non-negative")]
    InvalidPricing,

    #[error("'rate_limit.max_executions' and 'rate_limit.window_secs' must be greater than 0")]
    InvalidRateLimit,
}
