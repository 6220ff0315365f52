//! Per-host result payloads rendered by the CLI

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::redfish::{BootSourceOverrideEnabled, BootSourceOverrideTarget, PowerState, ResetType};

/// Attribute name to value, sorted for stable rendering
pub type AttributeSet = BTreeMap<String, Value>;

/// BIOS attributes read from a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiosAttributes {
    pub attributes: AttributeSet,
}

/// Staged attributes that differ from the live configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAttributes {
    pub pending: AttributeSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerStatus {
    pub power_state: Option<PowerState>,
}

/// Outcome of a reset action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerStateChange {
    pub previous_power_state: Option<PowerState>,
    pub reset_type: ResetType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootInfo {
    pub order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootOverride {
    pub target: BootSourceOverrideTarget,
    pub enabled: BootSourceOverrideEnabled,
    /// Present when the override was followed by an immediate restart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<PowerStateChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSummary {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub bios_version: Option<String>,
    pub firmware_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorSummary {
    pub socket: Option<String>,
    pub model: Option<String>,
    pub architecture: Option<String>,
    pub total_cores: Option<u32>,
    pub total_threads: Option<u32>,
    pub vendor_id: Option<String>,
}
