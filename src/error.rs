use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixVaultError {
    /// Non-2xx response from the JSON API, form endpoint or CDN.
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The edit source could not be read as an absolute URL with a path.
    #[error("Invalid source URL: {0}")]
    InvalidSource(String),

    #[error("A project is required when editing an uploaded image")]
    MissingProject,

    /// A 2xx response that lacks a field the workflow depends on.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The status endpoint answered with something other than 200 or 202.
    #[error("{label} failed with status {status}: {body}")]
    OperationFailed {
        label: String,
        status: u16,
        body: String,
    },

    #[error("{label} timed out after {}s: {url}", .timeout.as_secs_f64())]
    OperationTimedOut {
        label: String,
        timeout: Duration,
        url: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Inline image payload that is not a usable data-URI.
    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PixVaultError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            PixVaultError::ApiError { status, .. } => Some(*status),
            PixVaultError::OperationFailed { status, .. } => Some(*status),
            PixVaultError::RequestError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PixVaultError::OperationTimedOut { .. })
    }
}

pub type Result<T> = std::result::Result<T, PixVaultError>;
