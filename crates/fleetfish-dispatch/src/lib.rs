//! fleetfish-dispatch - Concurrent multi-host dispatcher
//!
//! Runs a caller-supplied per-host operation against every host of a
//! [`HostSet`](fleetfish_core::HostSet) in parallel and aggregates one
//! result per host into a [`FleetReport`](fleetfish_core::FleetReport).
//!
//! # Architecture
//!
//! ```text
//!   HostSet ──► dispatch_until ──spawn──► task(host 1) ─┐
//!                    │          ──spawn──► task(host 2) ─┤ JoinSet
//!                    │          ──spawn──► task(host N) ─┘
//!                    ▼                                   │
//!             collector loop ◄────── (host, outcome) ────┘
//!                    │
//!                    ▼
//!               FleetReport
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use fleetfish_dispatch::{dispatch, DispatchOptions};
//!
//! let report = dispatch(&hosts, &DispatchOptions::default(), |host| {
//!     let gateway = gateway.clone();
//!     async move { power_status(gateway.as_ref(), &host).await }
//! })
//! .await;
//! ```

mod action;
mod dispatcher;
mod shutdown;

pub use action::{send, ActionReport};
pub use dispatcher::{broadcast, dispatch, dispatch_until, DispatchOptions};
pub use shutdown::{Shutdown, ShutdownTrigger};
