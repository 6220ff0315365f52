//! Error types for BIOS attribute handling

use fleetfish_core::HostError;
use thiserror::Error;

use crate::template::Intent;

/// Errors raised while building registries or interpreting attribute input
#[derive(Debug, Error)]
pub enum BiosError {
    /// Decoder pattern is not a valid regular expression
    #[error("invalid decoder pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A `key=value` argument without `=`
    #[error("invalid attribute assignment {0:?}, expected key=value")]
    InvalidAssignment(String),

    /// Vendor has no preset entry
    #[error("unable to determine manufacturer for attribute collection; manufacturer detected: {0}")]
    UnknownVendor(String),

    /// Vendor is known but the requested preset carries no values
    #[error("{intent} preset is not available for {vendor}")]
    UnsupportedPreset { vendor: String, intent: Intent },

    /// Attribute file is not a mapping
    #[error("attribute file must be a mapping of names to values")]
    NotAMapping,

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for BIOS operations
pub type BiosResult<T> = Result<T, BiosError>;

impl From<BiosError> for HostError {
    fn from(err: BiosError) -> Self {
        match err {
            BiosError::UnknownVendor(vendor) => HostError::UnknownVendor(vendor),
            BiosError::UnsupportedPreset { vendor, intent } => HostError::UnsupportedPreset {
                vendor,
                intent: intent.to_string(),
            },
            other => HostError::InvalidRequest(other.to_string()),
        }
    }
}
