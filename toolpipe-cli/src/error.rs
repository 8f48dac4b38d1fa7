use thiserror::Error;
use toolpipe_core::agent::AgentError;
use toolpipe_core::catalog::CatalogError;
use toolpipe_core::config::ConfigError;
use toolpipe_core::definition::ToolCallError;
use toolpipe_core::schema::SchemaError;
use toolpipe_core::server::ServerError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    ToolCall(#[from] ToolCallError),
    #[error("invalid tool path '{0}'")]
    InvalidTarget(String),
    #[error("tool '{0}' was not found")]
    UnknownTool(String),
    #[error("prompt required via arguments, --prompt-file, or stdin")]
    MissingPrompt,
    #[error("invalid --params: {0}")]
    InvalidParams(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn user_message(&self) -> String {
        match self {
            CliError::Config(err) => err.to_string(),
            CliError::Catalog(err) => err.user_message(),
            CliError::Server(err) => err.user_message(),
            CliError::Agent(err) => err.user_message(),
            CliError::Schema(err) => err.user_message(),
            CliError::ToolCall(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
