pub mod agent;
pub mod app;
pub mod defaults;
pub mod error;
pub mod executor;
pub mod loader;
pub mod pricing;
pub mod provider;
pub mod rate_limit;
pub mod server;

pub use agent::AgentConfig;
pub use app::AppConfig;
pub use defaults::CONFIG_PATH;
pub use error::ConfigError;
pub use executor::{ExecutorConfig, ExecutorKind};
pub use loader::ensure_env_loaded;
pub use pricing::Pricing;
pub use provider::{ModelInfo, ModelProviderConfig};
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
