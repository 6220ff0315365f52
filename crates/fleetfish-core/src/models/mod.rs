//! Shared data models for fleet operations

mod redfish;
mod report;

pub use redfish::*;
pub use report::*;
