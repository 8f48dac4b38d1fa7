//! Dynamic model provider with multiple backends

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;

use super::factory::ProviderFactory;
use super::traits::{ModelClient, ModelProvider};
use super::types::{ModelError, ModelRequest, ModelResponse, ModelStream};
use crate::config::ModelProviderConfig;

/// Runtime container for a provider backend
struct ProviderRuntime {
    models: HashSet<String>,
    client: Box<dyn ModelClient>,
}

impl ProviderRuntime {
    fn supports(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.contains(model)
    }
}

/// Dynamic model provider that routes requests to appropriate backends
#[derive(Default)]
pub struct DynamicModelProvider {
    backends: HashMap<String, ProviderRuntime>,
}

impl DynamicModelProvider {
    /// Create provider from config list using factory
    pub fn from_configs(configs: &[ModelProviderConfig]) -> Self {
        let backends = configs
            .iter()
            .map(|config| {
                let models = config.models.iter().map(|m| m.name.clone()).collect();
                let runtime = ProviderRuntime {
                    models,
                    client: ProviderFactory::create(config),
                };
                (config.id.clone(), runtime)
            })
            .collect();
        Self { backends }
    }

    /// Registers a client under its own id, serving the given models.
    pub fn with_client(mut self, client: Box<dyn ModelClient>, models: &[&str]) -> Self {
        let models = models.iter().map(|m| m.to_string()).collect();
        self.backends
            .insert(client.id().to_string(), ProviderRuntime { models, client });
        self
    }

    /// Check if provider exists
    pub fn contains(&self, provider: &str) -> bool {
        self.backends.contains_key(provider)
    }

    fn route(&self, request: &ModelRequest) -> Result<&dyn ModelClient, ModelError> {
        let provider_id = &request.provider;
        let runtime = self
            .backends
            .get(provider_id)
            .ok_or_else(|| ModelError::provider_not_found(provider_id))?;

        if !runtime.supports(&request.model) {
            return Err(ModelError::model_not_found(provider_id, &request.model));
        }
        debug!(
            provider = provider_id.as_str(),
            model = request.model.as_str(),
            "Routing model request"
        );
        Ok(runtime.client.as_ref())
    }
}

impl std::fmt::Debug for DynamicModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicModelProvider")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl ModelProvider for DynamicModelProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.route(&request)?.chat(request).await
    }

    async fn chat_stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        self.route(&request)?.chat_stream(request).await
    }
}
