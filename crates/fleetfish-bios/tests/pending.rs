//! Reconciler against a session serving staged documents

use std::collections::HashMap;

use async_trait::async_trait;
use fleetfish_bios::{pending_changes, pending_changes_at, StagingLayout};
use fleetfish_core::{Bios, HostError, HostResult, Session};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

struct StagedSession {
    docs: HashMap<String, Value>,
}

#[async_trait]
impl Session for StagedSession {
    fn host(&self) -> &str {
        "staged"
    }

    async fn get(&self, path: &str) -> HostResult<Value> {
        self.docs
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::NotFound(path.to_string()))
    }

    async fn patch(&self, _path: &str, _body: &Value) -> HostResult<Value> {
        Ok(Value::Null)
    }

    async fn post(&self, _path: &str, _body: &Value) -> HostResult<Value> {
        Ok(Value::Null)
    }

    async fn logout(&self) -> HostResult<()> {
        Ok(())
    }
}

fn bios() -> Bios {
    serde_json::from_value(json!({
        "@odata.id": "/redfish/v1/Systems/Self/Bios/",
        "Attributes": { "Rome0162": "Auto", "Rome0565": "Enabled" }
    }))
    .unwrap()
}

fn session_with(staged: Value) -> StagedSession {
    let mut docs = HashMap::new();
    docs.insert("/redfish/v1/Systems/Self/Bios/Settings".to_string(), staged);
    StagedSession { docs }
}

#[tokio::test]
async fn pending_reports_only_changed_keys() {
    let session = session_with(json!({
        "Attributes": { "Rome0162": "Enabled", "Rome0565": "Enabled" }
    }));

    let pending = pending_changes(&session, &bios(), &StagingLayout::default())
        .await
        .unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending["Rome0162"], json!("Enabled"));
}

#[tokio::test]
async fn pending_without_container_is_unsupported() {
    let session = session_with(json!({ "@odata.id": "/redfish/v1/Systems/Self/Bios/Settings" }));

    let err = pending_changes(&session, &bios(), &StagingLayout::default())
        .await
        .unwrap_err();

    assert!(err.is_unsupported());
}

#[tokio::test]
async fn missing_staging_resource_is_a_lookup_error() {
    let session = StagedSession { docs: HashMap::new() };

    let err = pending_changes(&session, &bios(), &StagingLayout::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HostError::NotFound(_)));
}

fn bios_with_settings_object(path: &str) -> Bios {
    serde_json::from_value(json!({
        "@odata.id": "/redfish/v1/Systems/Self/Bios/",
        "@Redfish.Settings": { "SettingsObject": { "@odata.id": path } },
        "Attributes": { "Rome0162": "Auto", "Rome0565": "Enabled" }
    }))
    .unwrap()
}

#[tokio::test]
async fn pending_reads_the_advertised_settings_object() {
    let mut docs = HashMap::new();
    docs.insert(
        "/redfish/v1/Systems/Self/Bios/SD".to_string(),
        json!({ "Attributes": { "Rome0565": "Disabled" } }),
    );
    let session = StagedSession { docs };
    let bios = bios_with_settings_object("/redfish/v1/Systems/Self/Bios/SD");

    let pending = pending_changes(&session, &bios, &StagingLayout::default())
        .await
        .unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending["Rome0565"], json!("Disabled"));
}

#[tokio::test]
async fn pending_at_reads_the_given_path() {
    let mut docs = HashMap::new();
    docs.insert(
        "/redfish/v1/Systems/Self/Bios/SD".to_string(),
        json!({ "Attributes": { "Rome0162": "Enabled" } }),
    );
    docs.insert(
        "/redfish/v1/Systems/Self/Bios/Settings".to_string(),
        json!({ "Attributes": {} }),
    );
    let session = StagedSession { docs };

    let pending = pending_changes_at(
        &session,
        &bios(),
        "/redfish/v1/Systems/Self/Bios/SD",
        &StagingLayout::default(),
    )
    .await
    .unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending["Rome0162"], json!("Enabled"));
}
