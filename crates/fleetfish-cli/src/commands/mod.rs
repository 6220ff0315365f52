//! Command implementations for fleetfish
//!
//! Every handler opens one session per host through a `SessionGuard` and
//! releases it on every path, returning the aggregated report for the
//! caller to render.

pub mod bios;
pub mod boot;
pub mod power;
pub mod show;

pub use bios::{BiosChange, BiosQuery};
pub use boot::OverrideRequest;
