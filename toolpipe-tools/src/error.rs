use std::fmt;

use thiserror::Error;

/// Classification of outbound HTTP failures raised by `fetch-text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Dns,
    ConnectionRefused,
    Tls,
    Timeout,
    Status,
    Other,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchErrorKind::Dns => "dns",
            FetchErrorKind::ConnectionRefused => "connection_refused",
            FetchErrorKind::Tls => "tls",
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::Status => "status",
            FetchErrorKind::Other => "other",
        })
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{message}")]
    Fetch {
        kind: FetchErrorKind,
        message: String,
    },

    #[error("failed to encode tool output: {0}")]
    Output(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn fetch(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self::Fetch {
            kind,
            message: message.into(),
        }
    }
}
