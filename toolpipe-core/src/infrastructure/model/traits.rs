//! Model traits

use async_trait::async_trait;
use futures::stream;

use super::types::{ModelError, ModelRequest, ModelResponse, ModelStream, ModelStreamEvent};

/// Trait for model provider implementations
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send a chat request to the model provider
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Send a chat request and receive text deltas as they are generated.
    ///
    /// The default implementation performs a blocking call and replays its
    /// content as a single delta.
    async fn chat_stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        let response = self.chat(request).await?;
        Ok(replay(response))
    }
}

/// Trait for individual model clients
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Get the client ID
    fn id(&self) -> &str;

    /// Send a chat request
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Send a streamed chat request
    async fn chat_stream(&self, request: ModelRequest) -> Result<ModelStream, ModelError> {
        let response = self.chat(request).await?;
        Ok(replay(response))
    }
}

pub(crate) fn replay(response: ModelResponse) -> ModelStream {
    let mut events = Vec::with_capacity(2);
    if !response.content().is_empty() {
        events.push(Ok(ModelStreamEvent::Delta(response.content().to_string())));
    }
    events.push(Ok(ModelStreamEvent::Finished(response)));
    Box::pin(stream::iter(events))
}
