//! Common error types and handling for the APIM console

use reqwest::StatusCode;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the console crates
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Management API returned {status}: {body}")]
    Response { status: StatusCode, body: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map a non-success HTTP status returned by the management API
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Error::Validation(body),
            StatusCode::UNAUTHORIZED => Error::Authentication(body),
            StatusCode::FORBIDDEN => Error::Authorization(body),
            StatusCode::NOT_FOUND => Error::NotFound(body),
            StatusCode::CONFLICT => Error::Conflict(body),
            _ => Error::Response { status, body },
        }
    }

    /// Get the error code used in console output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::Response { .. } => "RESPONSE_ERROR",
            Error::Authentication(_) => "AUTHENTICATION_ERROR",
            Error::Authorization(_) => "AUTHORIZATION_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::from_status(status, err.to_string()),
            None if err.is_decode() => Error::Internal(format!("Invalid response body: {}", err)),
            None => Error::Transport(err.to_string()),
        }
    }
}
