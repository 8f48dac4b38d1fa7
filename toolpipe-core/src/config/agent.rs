use serde::Deserialize;

use super::defaults::DEFAULT_MAX_STEPS;

/// Agent settings from `[agent]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub default_provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_steps: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct RawAgentConfig {
    pub(super) default_provider: Option<String>,
    pub(super) model: Option<String>,
    #[serde(default)]
    pub(super) system_prompt: Option<String>,
    #[serde(default = "default_max_steps")]
    pub(super) max_steps: usize,
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}
