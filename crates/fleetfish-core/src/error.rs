//! Per-host error taxonomy
//!
//! Every failure that can happen while talking to one BMC is a
//! [`HostError`]. These never abort a fleet-wide batch: the dispatcher
//! stores them in the failing host's result slot and the renderer prints
//! them next to the successes.

use serde::Serialize;
use thiserror::Error;

/// Result type for per-host operations
pub type HostResult<T> = Result<T, HostError>;

/// Errors that can occur while operating on a single host
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HostError {
    /// Could not reach the BMC
    #[error("connection failed: {0}")]
    Connection(String),

    /// BMC rejected the credentials
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Request or host deadline elapsed
    #[error("operation timed out")]
    Timeout,

    /// An expected field is missing or null; the BMC/firmware lacks the capability
    #[error("unsupported by this BMC: {0}")]
    Unsupported(String),

    /// Resource does not exist on this BMC
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded into the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// BMC returned a non-success status
    #[error("BMC returned {status}: {message}")]
    Http { status: u16, message: String },

    /// None of the requested attribute keys exist on the host
    #[error("no matching keys found in: {0:?}")]
    NoMatchingAttributes(Vec<String>),

    /// Vendor has no entry in the preset catalog
    #[error("unable to determine manufacturer for attribute collection; manufacturer detected: {0}")]
    UnknownVendor(String),

    /// Vendor is known but the preset for this intent has no values
    #[error("{intent} preset is not available for {vendor}")]
    UnsupportedPreset { vendor: String, intent: String },

    /// Request could not be built from the given input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The batch was cancelled before this host finished
    #[error("cancelled before completion")]
    Cancelled,

    /// The per-host task panicked
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Coarse classification rendered as the `kind` field of error entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Protocol,
    Validation,
    Runtime,
}

impl HostError {
    /// Classify this error for machine-readable output
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::Connection(_) | HostError::Authentication(_) | HostError::Timeout => {
                ErrorKind::Connection
            }
            HostError::Unsupported(_)
            | HostError::NotFound(_)
            | HostError::InvalidResponse(_)
            | HostError::Http { .. } => ErrorKind::Protocol,
            HostError::NoMatchingAttributes(_)
            | HostError::UnknownVendor(_)
            | HostError::UnsupportedPreset { .. }
            | HostError::InvalidRequest(_) => ErrorKind::Validation,
            HostError::Cancelled | HostError::Panicked(_) => ErrorKind::Runtime,
        }
    }

    /// True when the BMC simply lacks a capability (as opposed to a transport fault)
    pub fn is_unsupported(&self) -> bool {
        matches!(self, HostError::Unsupported(_))
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HostError::Connection("host unreachable".to_string());
        assert_eq!(err.to_string(), "connection failed: host unreachable");

        let err = HostError::UnknownVendor("FOO CORP".to_string());
        assert!(err.to_string().contains("FOO CORP"));

        let err = HostError::Http {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "BMC returned 503: busy");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(HostError::Timeout.kind(), ErrorKind::Connection);
        assert_eq!(
            HostError::Unsupported("Attributes".into()).kind(),
            ErrorKind::Protocol
        );
        assert_eq!(
            HostError::NoMatchingAttributes(vec!["Foo".into()]).kind(),
            ErrorKind::Validation
        );
        assert_eq!(HostError::Cancelled.kind(), ErrorKind::Runtime);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Validation).unwrap();
        assert_eq!(json, "\"validation\"");
    }
}
