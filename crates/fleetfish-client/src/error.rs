//! Error types for Redfish client operations

use fleetfish_core::HostError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to a BMC
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// BMC returned an error response
    #[error("BMC error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// No username/password for a host
    #[error("no credentials provided for {0}, please provide a config file or environment variables")]
    MissingCredentials(String),

    /// Session could not be established
    #[error("Session error: {0}")]
    SessionError(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

impl ClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }
}

impl From<ClientError> for HostError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::HttpError(e) if e.is_timeout() => HostError::Timeout,
            ClientError::HttpError(e) if e.is_decode() => HostError::InvalidResponse(e.to_string()),
            ClientError::HttpError(e) => HostError::Connection(e.to_string()),
            ClientError::InvalidUrl(e) => HostError::InvalidRequest(e.to_string()),
            ClientError::IoError(e) => HostError::Connection(e.to_string()),
            ClientError::ServerError { status, message } => match status {
                401 | 403 => HostError::Authentication(message),
                404 => HostError::NotFound(message),
                408 | 504 => HostError::Timeout,
                _ => HostError::Http { status, message },
            },
            ClientError::ParseError(msg) => HostError::InvalidResponse(msg),
            e @ ClientError::MissingCredentials(_) => HostError::Authentication(e.to_string()),
            ClientError::SessionError(msg) => HostError::Authentication(msg),
            ClientError::Timeout => HostError::Timeout,
        }
    }
}
