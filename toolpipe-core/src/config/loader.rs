use super::agent::{AgentConfig, RawAgentConfig};
use super::defaults::{CONFIG_PATH, ENV_PATH};
use super::error::ConfigError;
use super::executor::{ExecutorConfig, RawExecutorConfig};
use super::pricing::Pricing;
use super::provider::{ModelProviderConfig, RawProviderConfig};
use super::rate_limit::RateLimitConfig;
use super::server::{RawServerConfig, ServerConfig};
use dotenvy::from_filename;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub server: RawServerConfig,
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,
    #[serde(default)]
    pub agent: RawAgentConfig,
    #[serde(default)]
    pub executor: RawExecutorConfig,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub catalog: Option<String>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Expands `~` and `${VAR}`; the input is kept when expansion fails.
pub(crate) fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<super::AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

fn read_config(path: &Path) -> Result<super::AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading toolpipe configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

pub(super) fn parse_config(content: &str, path: &Path) -> Result<super::AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed, path.parent())
}

fn validate_and_build(
    parsed: RawConfig,
    base_dir: Option<&Path>,
) -> Result<super::AppConfig, ConfigError> {
    let model = parsed.agent.model.ok_or(ConfigError::MissingModel)?;
    let default_provider = parsed
        .agent
        .default_provider
        .ok_or(ConfigError::MissingDefaultProvider)?;
    if parsed.agent.max_steps == 0 {
        return Err(ConfigError::InvalidMaxSteps);
    }

    if parsed.providers.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }

    let mut providers: Vec<ModelProviderConfig> = Vec::new();
    for raw_provider in parsed.providers {
        if raw_provider
            .endpoint
            .as_deref()
            .is_none_or(|e| e.trim().is_empty())
        {
            return Err(ConfigError::MissingEndpoint {
                provider: raw_provider.id.clone(),
            });
        }
        let mut provider = ModelProviderConfig::from(raw_provider);
        if !provider.is_openai() && !provider.is_ollama() {
            return Err(ConfigError::UnsupportedProviderType {
                provider: provider.id,
                provider_type: provider.provider_type,
            });
        }
        provider.endpoint = expand(&provider.endpoint);
        providers.push(provider);
    }
    if !providers.iter().any(|p| p.id == default_provider) {
        return Err(ConfigError::ProviderNotFound {
            provider: default_provider,
        });
    }
    if let Some(provider) = providers.iter_mut().find(|p| p.id == default_provider) {
        provider.ensure_model(&model);
    }

    let catalog = parsed.catalog.map(|raw| {
        let path = PathBuf::from(expand(&raw));
        match base_dir {
            Some(dir) if path.is_relative() && !dir.as_os_str().is_empty() => dir.join(path),
            _ => path,
        }
    });

    Ok(super::AppConfig {
        server: ServerConfig::try_from(parsed.server)?,
        providers,
        agent: AgentConfig {
            default_provider,
            model,
            system_prompt: parsed.agent.system_prompt.filter(|p| !p.trim().is_empty()),
            max_steps: parsed.agent.max_steps,
        },
        executor: ExecutorConfig::try_from(parsed.executor)?,
        pricing: parsed.pricing.validated()?,
        rate_limit: parsed.rate_limit.validated()?,
        catalog,
    })
}
