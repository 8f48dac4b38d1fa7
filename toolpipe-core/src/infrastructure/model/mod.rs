//! Model infrastructure module
//!
//! Chat-completions providers with function calling, blocking and streamed.
//!
//! # Structure
//! - `types` - Request, Response, stream event and Error types
//! - `traits` - ModelProvider, ModelClient traits
//! - `adapter` - OpenAI wire format for messages and tools
//! - `factory` - Provider factory for creating clients
//! - `clients` - Client implementations
//! - `provider` - DynamicModelProvider for routing

pub mod adapter;
pub mod clients;
pub mod factory;
pub mod provider;
pub mod traits;
pub mod types;

pub use provider::DynamicModelProvider;
pub use traits::{ModelClient, ModelProvider};
pub use types::{ModelError, ModelRequest, ModelResponse, ModelStream, ModelStreamEvent, ToolSpec};
