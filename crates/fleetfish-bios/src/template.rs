//! Vendor template catalog
//!
//! Turning virtualization on or off touches several BIOS attributes whose
//! names and values differ per vendor. The catalog holds one fixed
//! attribute set per vendor and intent. It is built once at startup and
//! shared read-only.

use std::collections::BTreeMap;
use std::fmt;

use fleetfish_core::AttributeSet;
use serde_json::{json, Value};

use crate::error::{BiosError, BiosResult};

/// Whether a preset switches a feature on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Enable,
    Disable,
}

impl Intent {
    pub fn from_enable(enable: bool) -> Self {
        if enable {
            Intent::Enable
        } else {
            Intent::Disable
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Enable => f.write_str("enable"),
            Intent::Disable => f.write_str("disable"),
        }
    }
}

/// Presets of one vendor. `None` marks a declared but empty preset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorPresets {
    pub enable: Option<AttributeSet>,
    pub disable: Option<AttributeSet>,
}

impl VendorPresets {
    fn get(&self, intent: Intent) -> Option<&AttributeSet> {
        match intent {
            Intent::Enable => self.enable.as_ref(),
            Intent::Disable => self.disable.as_ref(),
        }
    }
}

/// Catalog of virtualization presets keyed by normalized vendor name
#[derive(Debug, Clone, Default)]
pub struct VendorCatalog {
    vendors: BTreeMap<String, VendorPresets>,
}

/// Normalize a manufacturer string for catalog lookup
pub fn normalize_vendor(vendor: &str) -> String {
    vendor.trim().to_uppercase()
}

fn attribute_set<const N: usize>(pairs: [(&str, Value); N]) -> AttributeSet {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

impl VendorCatalog {
    /// An empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in vendor presets
    pub fn builtin() -> Self {
        let intel = VendorPresets {
            enable: Some(attribute_set([
                ("VTdSupport", json!(1)),
                ("SRIOVEnable", json!(1)),
                ("ProcessorX2apic", json!(1)),
                ("ProcessorVmxEnable", json!(1)),
            ])),
            disable: Some(attribute_set([
                ("VTdSupport", json!(0)),
                ("SRIOVEnable", json!(0)),
                ("ProcessorX2apic", json!(0)),
                ("ProcessorVmxEnable", json!(0)),
            ])),
        };

        // Rome boards; SR-IOV here only covers onboard NICs
        let gigabyte = VendorPresets {
            enable: Some(attribute_set([
                ("Rome0162", json!("Enabled")),
                ("Rome0565", json!("Enabled")),
                ("PCIS007", json!("Enabled")),
                ("Rome0059", json!("Auto")),
                ("Rome0039", json!("Auto")),
            ])),
            disable: Some(attribute_set([
                ("Rome0162", json!("Disabled")),
                ("Rome0565", json!("Disabled")),
                ("PCIS007", json!("Disabled")),
                ("Rome0059", json!("Disabled")),
                ("Rome0039", json!("Disabled")),
            ])),
        };

        let hpe = VendorPresets {
            enable: Some(attribute_set([
                ("ProcAmdVirtualization", json!("Enabled")),
                ("ProcAmdIOMMU", json!("Enabled")),
                ("Sriov", json!("Enabled")),
                ("ProcX2Apic", json!("Auto")),
            ])),
            disable: Some(attribute_set([
                ("ProcAmdVirtualization", json!("Disabled")),
                ("ProcAmdIOMMU", json!("Disabled")),
                ("Sriov", json!("Disabled")),
                ("ProcX2Apic", json!("Disabled")),
            ])),
        };

        Self::new()
            .with_vendor("Intel Corporation", intel)
            .with_vendor("GIGABYTE", gigabyte.clone())
            .with_vendor("Cray Inc.", gigabyte)
            .with_vendor("HPE", hpe)
    }

    /// Add or replace a vendor's presets
    pub fn with_vendor(mut self, vendor: &str, presets: VendorPresets) -> Self {
        self.vendors.insert(normalize_vendor(vendor), presets);
        self
    }

    /// Normalized names of every known vendor
    pub fn vendors(&self) -> impl Iterator<Item = &str> {
        self.vendors.keys().map(String::as_str)
    }

    /// Preset for `vendor`; `enable` picks the enable or disable set
    pub fn template(&self, enable: bool, vendor: &str) -> BiosResult<AttributeSet> {
        let intent = Intent::from_enable(enable);
        let normalized = normalize_vendor(vendor);

        let presets = self
            .vendors
            .get(&normalized)
            .ok_or_else(|| BiosError::UnknownVendor(normalized.clone()))?;

        presets
            .get(intent)
            .cloned()
            .ok_or(BiosError::UnsupportedPreset {
                vendor: normalized,
                intent,
            })
    }
}
