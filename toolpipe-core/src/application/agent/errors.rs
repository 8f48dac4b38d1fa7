use thiserror::Error;

use crate::infrastructure::model::ModelError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("run cancelled: event receiver closed")]
    Cancelled,
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::EmptyPrompt => "Prompt is required.".to_string(),
            AgentError::Cancelled => "Execution was cancelled.".to_string(),
        }
    }
}
