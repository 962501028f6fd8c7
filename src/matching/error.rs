// src/matching/error.rs
use thiserror::Error;

/// Failure of a single matcher attempt. Never escapes the engine.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("quota or rate limit exhausted (status {status:?}): {message}")]
    QuotaExhausted { status: Option<u16>, message: String },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed model response: {0}")]
    Malformed(String),
}

/// Coarse classification used by the engine's routing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Quota,
    NotConfigured,
    Unavailable,
    Malformed,
    Transport,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Quota => "quota",
            ErrorKind::NotConfigured => "not_configured",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Transport => "transport",
        }
    }
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::QuotaExhausted { .. } => ErrorKind::Quota,
            MatchError::NotConfigured(_) => ErrorKind::NotConfigured,
            MatchError::Unavailable(_) => ErrorKind::Unavailable,
            MatchError::Malformed(_) => ErrorKind::Malformed,
            MatchError::Http(_) | MatchError::Api { .. } => ErrorKind::Transport,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        MatchError::Malformed(msg.into())
    }
}

impl From<serde_json::Error> for MatchError {
    fn from(e: serde_json::Error) -> Self {
        MatchError::Malformed(e.to_string())
    }
}
