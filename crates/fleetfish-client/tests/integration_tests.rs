//! Integration tests for fleetfish-client
//!
//! These tests serve a mock BMC over real HTTP and drive it through the
//! gateway, so the wire handling stays in sync with the Redfish models.

use std::time::Duration;

use fleetfish_client::testing::{wait_for, MockBmc};
use fleetfish_client::{AuthMode, ClientConfig, CredentialStore, Credentials, RedfishGateway};
use fleetfish_core::{resources, Gateway, HostError, PowerState, ResetType, SessionGuard};
use serde_json::json;

fn gateway(auth: AuthMode) -> RedfishGateway {
    let config = ClientConfig {
        auth,
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    };
    RedfishGateway::new(config, CredentialStore::new(Credentials::new("root", "calvin"))).unwrap()
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_basic_auth_reads_system_and_bios() {
    let bmc = MockBmc::gigabyte_rome();
    let server = bmc.serve().await.unwrap();

    let session = gateway(AuthMode::Basic).connect(&server.host()).await.unwrap();
    let system = resources::first_system(session.as_ref()).await.unwrap();

    assert_eq!(system.manufacturer.as_deref(), Some("GIGABYTE"));
    assert_eq!(system.power_state, Some(PowerState::On));
    assert_eq!(
        system.processor_summary.as_ref().and_then(|p| p.model.as_deref()),
        Some("AMD EPYC 7702 64-Core Processor")
    );

    let bios = resources::bios(session.as_ref(), &system).await.unwrap();
    assert_eq!(bios.attributes["Rome0565"], json!("Disabled"));
    assert_eq!(bios.settings_object(), Some("/redfish/v1/Systems/1/Bios/Settings"));

    // Basic auth never creates server-side sessions
    session.logout().await.unwrap();
    assert_eq!(bmc.sessions_opened(), 0);
}

#[tokio::test]
async fn test_processors_and_managers() {
    let bmc = MockBmc::intel();
    let server = bmc.serve().await.unwrap();

    let session = gateway(AuthMode::Basic).connect(&server.host()).await.unwrap();
    let system = resources::first_system(session.as_ref()).await.unwrap();

    let processors = resources::processors(session.as_ref(), &system).await.unwrap();
    assert_eq!(processors.len(), 2);
    assert_eq!(processors[1].socket.as_deref(), Some("P1"));

    let managers = resources::managers(session.as_ref()).await.unwrap();
    assert_eq!(managers[0].firmware_version.as_deref(), Some("2.0.0"));
}

#[tokio::test]
async fn test_boot_option_lookup() {
    let bmc = MockBmc::hpe();
    let server = bmc.serve().await.unwrap();
    let session = gateway(AuthMode::Basic).connect(&server.host()).await.unwrap();
    let system = resources::first_system(session.as_ref()).await.unwrap();

    let description = resources::boot_option_description(session.as_ref(), &system, "Boot0001")
        .await
        .unwrap();
    assert_eq!(description.as_deref(), Some("UEFI PXE IPv4"));

    let bare = MockBmc::hpe().without_boot_options();
    let bare_server = bare.serve().await.unwrap();
    let session = gateway(AuthMode::Basic).connect(&bare_server.host()).await.unwrap();
    let description = resources::boot_option_description(session.as_ref(), &system, "Boot0001")
        .await
        .unwrap();
    assert_eq!(description, None);
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_reset_and_bios_patch() {
    let bmc = MockBmc::gigabyte_rome().with_power_state("Off");
    let server = bmc.serve().await.unwrap();
    let session = gateway(AuthMode::Basic).connect(&server.host()).await.unwrap();
    let system = resources::first_system(session.as_ref()).await.unwrap();

    resources::reset(session.as_ref(), &system, ResetType::On).await.unwrap();
    assert_eq!(bmc.resets(), vec!["On".to_string()]);
    assert_eq!(bmc.power_state(), "On");

    let body = json!({ "Attributes": { "Rome0565": "Enabled" } });
    let response = session
        .patch("/redfish/v1/Systems/1/Bios/Settings", &body)
        .await
        .unwrap();
    assert!(response.is_null());
    assert_eq!(bmc.staged(), Some(json!({ "Rome0565": "Enabled" })));
}

#[tokio::test]
async fn test_failed_reset_reports_http_error() {
    let bmc = MockBmc::hpe().failing_resets();
    let server = bmc.serve().await.unwrap();
    let session = gateway(AuthMode::Basic).connect(&server.host()).await.unwrap();
    let system = resources::first_system(session.as_ref()).await.unwrap();

    let err = resources::reset(session.as_ref(), &system, ResetType::ForceOff)
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::Http { status: 400, message } if message.contains("reset not allowed")));
}

// =============================================================================
// Sessions and failures
// =============================================================================

#[tokio::test]
async fn test_session_auth_logs_out() {
    let bmc = MockBmc::gigabyte_rome();
    let server = bmc.serve().await.unwrap();
    let gateway = gateway(AuthMode::Session);

    let guard = SessionGuard::open(&gateway, &server.host()).await.unwrap();
    assert_eq!(bmc.active_sessions(), 1);

    let system = resources::first_system(&*guard).await.unwrap();
    assert_eq!(system.id.as_deref(), Some("1"));

    guard.release().await.unwrap();
    assert_eq!(bmc.active_sessions(), 0);
    assert_eq!(bmc.sessions_opened(), 1);
}

#[tokio::test]
async fn test_dropped_guard_still_logs_out() {
    let bmc = MockBmc::hpe();
    let server = bmc.serve().await.unwrap();
    let gateway = gateway(AuthMode::Session);

    {
        let _guard = SessionGuard::open(&gateway, &server.host()).await.unwrap();
        assert_eq!(bmc.active_sessions(), 1);
    }

    assert!(wait_for(|| bmc.active_sessions() == 0, Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_rejected_credentials() {
    for auth in [AuthMode::Basic, AuthMode::Session] {
        let bmc = MockBmc::hpe().rejecting_credentials();
        let server = bmc.serve().await.unwrap();

        let err = gateway(auth).connect(&server.host()).await.err().expect("connect should fail");
        assert!(matches!(err, HostError::Authentication(_)), "{auth}: {err:?}");
    }
}

#[tokio::test]
async fn test_missing_credentials_fail_before_connecting() {
    let gateway = RedfishGateway::new(ClientConfig::default(), CredentialStore::default()).unwrap();
    let err = gateway.connect("http://127.0.0.1:9").await.err().expect("connect should fail");
    assert!(matches!(err, HostError::Authentication(msg) if msg.contains("no credentials")));
}

#[tokio::test]
async fn test_missing_resource_maps_to_not_found() {
    let bmc = MockBmc::hpe();
    let server = bmc.serve().await.unwrap();
    let session = gateway(AuthMode::Basic).connect(&server.host()).await.unwrap();

    let err = session.get("/redfish/v1/Chassis/9").await.unwrap_err();
    assert!(matches!(err, HostError::NotFound(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    let bmc = MockBmc::hpe();
    let server = bmc.serve().await.unwrap();
    let host = server.host();
    server.shutdown().await;

    let err = gateway(AuthMode::Basic).connect(&host).await.err().expect("connect should fail");
    assert!(matches!(err, HostError::Connection(_)), "{err:?}");
}

#[tokio::test]
async fn test_slow_bmc_times_out() {
    let bmc = MockBmc::hpe().with_latency(Duration::from_millis(500));
    let server = bmc.serve().await.unwrap();
    let config = ClientConfig {
        timeout: Duration::from_millis(100),
        ..ClientConfig::default()
    };
    let gateway =
        RedfishGateway::new(config, CredentialStore::new(Credentials::new("root", "calvin"))).unwrap();

    let err = gateway.connect(&server.host()).await.err().expect("connect should fail");
    assert_eq!(err, HostError::Timeout);
}
