//! # Provider Configuration
//!
//! Model providers speak the OpenAI chat-completions protocol with function
//! calling.
//!
//! | Type | Description | API Key Required |
//! |------|-------------|-----------------|
//! | `openai` | OpenAI-compatible APIs | Yes |
//! | `ollama` | Local Ollama server (OpenAI-compatible endpoint) | No |

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::defaults::DEFAULT_API_PATH;

/// Information about an available model from a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ModelInfo {
    /// Model identifier used in API calls (e.g., "gpt-4o-mini")
    pub name: String,
    /// Human-readable display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Configuration for an AI model provider.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "openai"
/// type = "openai"
/// endpoint = "https://api.openai.com"
/// api_key = "OPENAI_API_KEY"
/// models = ["gpt-4o-mini", { name = "gpt-4o", display_name = "GPT-4o" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ModelProviderConfig {
    pub id: String,
    /// `openai` or `ollama`
    #[serde(rename = "type")]
    pub provider_type: String,
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_path: String,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    #[serde(rename = "type", default)]
    pub(super) provider_type: String,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default)]
    pub(super) models: Vec<RawModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum RawModelInfo {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        display_name: Option<String>,
    },
}

impl From<RawModelInfo> for ModelInfo {
    fn from(value: RawModelInfo) -> Self {
        match value {
            RawModelInfo::Name(name) => Self {
                name,
                display_name: None,
            },
            RawModelInfo::Detailed { name, display_name } => Self { name, display_name },
        }
    }
}

impl From<RawProviderConfig> for ModelProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        let provider_type = if raw.provider_type.trim().is_empty() {
            "openai".to_string()
        } else {
            raw.provider_type.trim().to_lowercase()
        };
        Self {
            id: raw.id,
            provider_type,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw
                .api_path
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_PATH.to_string()),
            models: raw.models.into_iter().map(ModelInfo::from).collect(),
        }
    }
}

impl ModelProviderConfig {
    /// Ensure a model exists in this provider's model list
    pub fn ensure_model(&mut self, model: &str) {
        if self.models.iter().all(|info| info.name != model) {
            self.models.push(ModelInfo {
                name: model.to_string(),
                display_name: None,
            });
        }
    }

    pub fn is_ollama(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("ollama")
    }

    pub fn is_openai(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("openai")
    }
}
