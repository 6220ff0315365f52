//! fleetfish Redfish client
//!
//! Implements the [`Gateway`](fleetfish_core::Gateway) seam over HTTP. A
//! [`RedfishGateway`] owns one shared connection pool and opens a
//! [`RedfishSession`] per host, authenticated with basic auth or with a
//! Redfish session token.
//!
//! # Example
//!
//! ```rust,no_run
//! use fleetfish_client::{ClientConfig, CredentialStore, Credentials, RedfishGateway};
//! use fleetfish_core::{resources, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let credentials = CredentialStore::new(Credentials::new("root", "calvin"))
//!         .with_env_overrides(|name| std::env::var(name).ok());
//!     let gateway = RedfishGateway::new(ClientConfig::default(), credentials)?;
//!
//!     let session = gateway.connect("bmc-01.example.net").await?;
//!     let system = resources::first_system(session.as_ref()).await?;
//!     println!("{:?}", system.power_state);
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module serves an in-memory BMC:
//!
//! ```rust,ignore
//! use fleetfish_client::testing::MockBmc;
//!
//! let bmc = MockBmc::gigabyte_rome();
//! let server = bmc.serve().await?;
//! let session = gateway.connect(&server.host()).await?;
//! ```

mod client;
mod credentials;
mod error;
mod gateway;
pub mod testing;

pub use client::{AuthMode, ClientConfig, RedfishSession, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
pub use credentials::{CredentialStore, Credentials, PASSWORD_ENVS, USERNAME_ENV};
pub use error::{ClientError, Result};
pub use gateway::RedfishGateway;
