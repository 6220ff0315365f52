//! fleetfish-core - Core traits and types for fleet-wide BMC management
//!
//! This crate provides the shared result/error model, host resolution,
//! Redfish resource models and the `Gateway`/`Session` seam that the
//! dispatcher, BIOS logic and CLI are written against.

pub mod error;
pub mod gateway;
pub mod hosts;
pub mod models;
pub mod paths;
pub mod report;
pub mod resources;

pub use error::{ErrorKind, HostError, HostResult};
pub use gateway::{Gateway, Session, SessionGuard};
pub use hosts::{HostSet, NoHosts};
pub use models::*;
pub use report::{FleetReport, HostOutcome};
