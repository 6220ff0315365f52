//! fleetfish-bios - BIOS attribute logic for fleet management
//!
//! Normalizes raw, vendor-specific firmware configuration into a stable
//! view and reports which staged changes will actually take effect.
//!
//! # Features
//!
//! - **Decoder registry** - regex-selected tables that translate raw keys
//!   such as `Rome0162` into `Rome0162 (IOMMU)`
//! - **Vendor catalog** - per-vendor virtualization presets
//! - **Reconciler** - staged vs. live diff of BIOS settings
//! - **Attribute input** - `key=value` arguments and YAML files
//!
//! # Quick Start
//!
//! ```rust
//! use fleetfish_bios::{DecodeMode, DecoderRegistry, VendorCatalog};
//!
//! let registry = DecoderRegistry::builtin().unwrap();
//! let decoder = registry.lookup("AMD EPYC 7702 64-Core Processor").unwrap();
//! assert_eq!(decoder.decode("Rome0565", DecodeMode::Display), "Rome0565 (SVM Mode)");
//!
//! let catalog = VendorCatalog::builtin();
//! let preset = catalog.template(true, "hpe").unwrap();
//! assert_eq!(preset["Sriov"], "Enabled");
//! ```

pub mod attributes;
pub mod decoder;
pub mod definition;
pub mod error;
pub mod reconcile;
pub mod template;

pub use attributes::{load_attribute_file, parse_assignments, retain_known, select_attributes};
pub use decoder::{decode_key, DecodeMode, Decoder, DecoderRegistry};
pub use definition::{AttributeDefinition, AttributeValue, DecoderTable, TableMeta};
pub use error::{BiosError, BiosResult};
pub use reconcile::{diff_pending, pending_changes, pending_changes_at, StagingLayout};
pub use template::{normalize_vendor, Intent, VendorCatalog, VendorPresets};
