//! Fleet-level integration tests for fleetfish
//!
//! The tests in `tests/` start several mock BMCs on local ports and drive
//! the command handlers against them over real HTTP, the same way the
//! `fleetfish` binary does.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fleetfish-tests
//! ```
//!
//! # Test Structure
//!
//! - `fleet_e2e_test.rs` - bios, power, boot and show commands across a
//!   mixed fleet, including unreachable and misbehaving hosts

use std::sync::Arc;
use std::time::Duration;

use fleetfish_cli::Fleet;
use fleetfish_client::testing::{MockBmc, TestServer};
use fleetfish_client::{AuthMode, ClientConfig, CredentialStore, Credentials, RedfishGateway};
use fleetfish_core::HostSet;
use fleetfish_dispatch::DispatchOptions;

/// A host that refuses connections
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

/// Several mock BMCs served on local ports
pub struct MockFleet {
    members: Vec<(MockBmc, TestServer)>,
}

impl MockFleet {
    pub async fn start(bmcs: Vec<MockBmc>) -> Self {
        let mut members = Vec::with_capacity(bmcs.len());
        for bmc in bmcs {
            let server = bmc.serve().await.expect("mock BMC should bind");
            members.push((bmc, server));
        }
        Self { members }
    }

    /// Host identifier of the `index`th BMC
    pub fn host(&self, index: usize) -> String {
        self.members[index].1.host()
    }

    pub fn bmc(&self, index: usize) -> &MockBmc {
        &self.members[index].0
    }

    /// Every BMC of the fleet
    pub fn hosts(&self) -> HostSet {
        self.hosts_with(&[])
    }

    /// Every BMC plus `extra` hosts
    pub fn hosts_with(&self, extra: &[&str]) -> HostSet {
        let hosts = self
            .members
            .iter()
            .map(|(_, server)| server.host())
            .chain(extra.iter().map(|h| h.to_string()));
        HostSet::new(hosts).expect("fleet has hosts")
    }

    /// Sessions still open across the fleet
    pub fn active_sessions(&self) -> usize {
        self.members.iter().map(|(bmc, _)| bmc.active_sessions()).sum()
    }

    /// Handler context talking to this fleet
    pub fn fleet(&self, auth: AuthMode) -> Fleet {
        let config = ClientConfig {
            auth,
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            ..ClientConfig::default()
        };
        let credentials = CredentialStore::new(Credentials::new("root", "calvin"));
        let gateway = RedfishGateway::new(config, credentials).expect("gateway should build");

        Fleet::new(Arc::new(gateway))
            .expect("built-in decoders should load")
            .with_options(DispatchOptions::quiet())
    }
}
