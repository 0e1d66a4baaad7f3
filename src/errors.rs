use crate::providers::Provider;
use std::time::Duration;
use thiserror::Error;

/// Main error type for media-rank
#[derive(Error, Debug)]
pub enum MediaRankError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Non-success response or explicit error payload from a provider
    #[error("{provider} API error: {message}")]
    Upstream {
        provider: Provider,
        status: Option<u16>,
        message: String,
    },

    /// The search matched nothing usable
    #[error("{0}")]
    NotFound(String),

    #[error("{provider} authentication failed: {message}")]
    Auth { provider: Provider, message: String },

    #[error("{provider} request timed out after {}s", .after.as_secs())]
    Timeout { provider: Provider, after: Duration },

    #[error("Pagination stopped after {max_pages} pages without reaching the last page")]
    TooManyPages { max_pages: u32 },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MediaRankError {
    /// Errors worth retrying: throttling, server faults, dropped connections
    pub fn is_transient(&self) -> bool {
        match self {
            MediaRankError::Network(e) => e.is_timeout() || e.is_connect(),
            MediaRankError::Upstream {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            MediaRankError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// The provider rejected the credentials attached to the request
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            MediaRankError::Upstream {
                status: Some(401),
                ..
            }
        )
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, MediaRankError>;
