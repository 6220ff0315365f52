//! Redfish resource shapes
//!
//! Only the properties the fleet commands read are modelled. Everything
//! else a BMC returns is ignored during deserialization.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to another resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ODataLink {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

/// A resource collection such as `/redfish/v1/Systems`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Collection {
    #[serde(default)]
    pub members: Vec<ODataLink>,
}

/// Power state reported by a computer system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    On,
    Off,
    PoweringOn,
    PoweringOff,
    Paused,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::On => "On",
            PowerState::Off => "Off",
            PowerState::PoweringOn => "PoweringOn",
            PowerState::PoweringOff => "PoweringOff",
            PowerState::Paused => "Paused",
        };
        f.write_str(s)
    }
}

/// Argument of the `ComputerSystem.Reset` action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetType {
    On,
    ForceOff,
    GracefulShutdown,
    GracefulRestart,
    ForceRestart,
    Nmi,
    ForceOn,
    PushPowerButton,
    PowerCycle,
}

impl fmt::Display for ResetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResetType::On => "On",
            ResetType::ForceOff => "ForceOff",
            ResetType::GracefulShutdown => "GracefulShutdown",
            ResetType::GracefulRestart => "GracefulRestart",
            ResetType::ForceRestart => "ForceRestart",
            ResetType::Nmi => "Nmi",
            ResetType::ForceOn => "ForceOn",
            ResetType::PushPowerButton => "PushPowerButton",
            ResetType::PowerCycle => "PowerCycle",
        };
        f.write_str(s)
    }
}

/// Device the next boot is redirected to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootSourceOverrideTarget {
    None,
    Pxe,
    Hdd,
    BiosSetup,
    UefiHttp,
    Cd,
    Usb,
}

/// How long a boot override stays in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootSourceOverrideEnabled {
    Disabled,
    Once,
    Continuous,
}

/// `Boot` property of a computer system.
///
/// Override values are kept as reported: BMCs use targets such as
/// `UefiTarget` or `Diags` that this tool never writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Boot {
    #[serde(default)]
    pub boot_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_source_override_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_source_override_enabled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_source_override_mode: Option<String>,
}

/// Request body for a boot override PATCH
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BootOverrideRequest {
    pub boot_source_override_target: BootSourceOverrideTarget,
    pub boot_source_override_enabled: BootSourceOverrideEnabled,
    pub boot_source_override_mode: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessorSummaryInfo {
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub model: Option<String>,
}

/// A computer system (one physical node)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputerSystem {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub bios_version: Option<String>,
    #[serde(default)]
    pub power_state: Option<PowerState>,
    #[serde(default)]
    pub boot: Boot,
    #[serde(default)]
    pub processor_summary: Option<ProcessorSummaryInfo>,
    #[serde(default)]
    pub bios: Option<ODataLink>,
    #[serde(default)]
    pub processors: Option<ODataLink>,
}

/// `@Redfish.Settings` annotation on a resource with a staging object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingsAnnotation {
    #[serde(default)]
    pub settings_object: Option<ODataLink>,
}

/// The BIOS resource of a system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bios {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default, rename = "@Redfish.Settings")]
    pub settings: Option<SettingsAnnotation>,
}

impl Bios {
    /// Path of the settings object, if the BMC advertises one
    pub fn settings_object(&self) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|s| s.settings_object.as_ref())
            .map(|link| link.odata_id.as_str())
    }
}

/// A BMC manager resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manager {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessorId {
    #[serde(default)]
    pub vendor_id: Option<String>,
}

/// One processor socket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Processor {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    #[serde(default)]
    pub socket: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub processor_architecture: Option<String>,
    #[serde(default)]
    pub total_cores: Option<u32>,
    #[serde(default)]
    pub total_threads: Option<u32>,
    #[serde(default)]
    pub processor_id: Option<ProcessorId>,
}

/// One entry of a system's `BootOptions` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BootOption {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_deserializes_redfish_names() {
        let system: ComputerSystem = serde_json::from_value(json!({
            "@odata.id": "/redfish/v1/Systems/Self",
            "Id": "Self",
            "Manufacturer": "GIGABYTE",
            "Model": "R272-Z30",
            "BiosVersion": "R21",
            "PowerState": "On",
            "Boot": {
                "BootOrder": ["Boot0001", "Boot0002"],
                "BootNext": "",
                "BootSourceOverrideTarget": "Pxe",
                "BootSourceOverrideEnabled": "Once"
            },
            "ProcessorSummary": { "Count": 2, "Model": "AMD EPYC 7702 64-Core Processor" },
            "Bios": { "@odata.id": "/redfish/v1/Systems/Self/Bios" },
            "Status": { "State": "Enabled" }
        }))
        .unwrap();

        assert_eq!(system.manufacturer.as_deref(), Some("GIGABYTE"));
        assert_eq!(system.power_state, Some(PowerState::On));
        assert_eq!(system.boot.boot_order.len(), 2);
        assert_eq!(system.boot.boot_source_override_target.as_deref(), Some("Pxe"));
        assert_eq!(
            system.bios.map(|b| b.odata_id).as_deref(),
            Some("/redfish/v1/Systems/Self/Bios")
        );
    }

    #[test]
    fn test_system_accepts_override_targets_it_never_writes() {
        let system: ComputerSystem = serde_json::from_value(json!({
            "@odata.id": "/redfish/v1/Systems/1",
            "PowerState": "On",
            "Boot": {
                "BootOrder": ["Boot0001"],
                "BootSourceOverrideTarget": "UefiTarget",
                "BootSourceOverrideEnabled": "Continuous",
                "BootSourceOverrideMode": "UEFI"
            }
        }))
        .unwrap();

        assert_eq!(system.boot.boot_source_override_target.as_deref(), Some("UefiTarget"));
        assert_eq!(system.boot.boot_source_override_enabled.as_deref(), Some("Continuous"));
    }

    #[test]
    fn test_bios_settings_object() {
        let bios: Bios = serde_json::from_value(json!({
            "@odata.id": "/redfish/v1/Systems/1/Bios",
            "Attributes": { "Rome0162": "Enabled" },
            "@Redfish.Settings": {
                "SettingsObject": { "@odata.id": "/redfish/v1/Systems/1/Bios/SD" }
            }
        }))
        .unwrap();

        assert_eq!(bios.settings_object(), Some("/redfish/v1/Systems/1/Bios/SD"));
        assert_eq!(bios.attributes["Rome0162"], json!("Enabled"));
    }

    #[test]
    fn test_boot_override_request_body() {
        let body = serde_json::to_value(BootOverrideRequest {
            boot_source_override_target: BootSourceOverrideTarget::BiosSetup,
            boot_source_override_enabled: BootSourceOverrideEnabled::Once,
            boot_source_override_mode: "UEFI".into(),
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "BootSourceOverrideTarget": "BiosSetup",
                "BootSourceOverrideEnabled": "Once",
                "BootSourceOverrideMode": "UEFI"
            })
        );
    }
}
