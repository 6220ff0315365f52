//! Decoder table definitions
//!
//! A decoder table maps the raw attribute keys of one hardware family to
//! their canonical and display names. Tables are definition files in YAML
//! (or JSON, which YAML accepts):
//!
//! ```yaml
//! meta:
//!   name: AMD EPYC Rome
//!   pattern: "^AMD EPYC"
//!
//! attributes:
//!   Rome0162:
//!     attribute_name: Rome0162
//!     display_name: " IOMMU"
//!     help_text: Enable/Disable IOMMU
//!     type: Enumeration
//!     default_value: Auto
//!     values:
//!       - { name: Enabled, display_name: Enabled }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BiosResult;

/// Built-in table for AMD EPYC Rome systems
const AMD_EPYC_ROME: &str = include_str!("../decoders/amd-epyc-rome.yaml");

/// Table metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableMeta {
    /// Name of the hardware family
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Model pattern this table is meant for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// One allowed value of an enumeration attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Definition of a single raw attribute key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Canonical name, used for machine-readable output
    pub attribute_name: String,

    /// Human-readable name; may carry leading padding from the BMC
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    #[serde(default)]
    pub read_only: bool,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<AttributeValue>,
}

/// A complete decoder table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderTable {
    #[serde(default)]
    pub meta: TableMeta,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDefinition>,
}

impl DecoderTable {
    /// Load a table from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> BiosResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load a table from a YAML (or JSON) string
    pub fn from_yaml(yaml: &str) -> BiosResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// The embedded AMD EPYC Rome table
    pub fn amd_epyc_rome() -> BiosResult<Self> {
        Self::from_yaml(AMD_EPYC_ROME)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeDefinition> {
        self.attributes.get(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
