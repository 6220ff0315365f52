//! Pending-change reconciliation
//!
//! BIOS writes are staged: the BMC stores them in a settings sub-resource
//! and applies them on the next boot. Comparing that staged document with
//! the live attributes tells which writes will actually change anything.

use fleetfish_core::{paths, AttributeSet, Bios, HostError, HostResult, Session};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where the staged attributes live relative to the BIOS resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingLayout {
    /// Path segment appended to the BIOS resource identifier
    pub suffix: String,
    /// Candidate container keys, tried in order
    pub container_keys: Vec<String>,
}

impl Default for StagingLayout {
    fn default() -> Self {
        Self {
            suffix: "Settings".to_string(),
            container_keys: vec!["Attributes".to_string()],
        }
    }
}

impl StagingLayout {
    /// Staging path derived from a live resource identifier
    pub fn staging_path(&self, odata_id: &str) -> String {
        paths::child_path(odata_id, &self.suffix)
    }

    /// Settings object advertised by `bios`, falling back to the staging path
    pub fn settings_path(&self, bios: &Bios) -> String {
        match bios.settings_object() {
            Some(path) => path.to_string(),
            None => self.staging_path(&bios.odata_id),
        }
    }

    /// Pull the attribute container out of a staged document.
    ///
    /// The first candidate key holding a non-null value decides; a value
    /// that is not an object is as unusable as a missing one.
    pub fn extract(&self, staged: &Value) -> HostResult<AttributeSet> {
        let found = self
            .container_keys
            .iter()
            .find_map(|key| staged.get(key).filter(|v| !v.is_null()).map(|v| (key, v)));

        match found {
            Some((_, Value::Object(map))) => Ok(map.clone().into_iter().collect()),
            Some((key, _)) => Err(HostError::Unsupported(format!(
                "{:?} in staged settings is not an object",
                key
            ))),
            None => Err(HostError::Unsupported(format!(
                "{} does not exist or is null, the BIOS/firmware may need to be updated for proper Attributes support",
                self.container_keys.join("/")
            ))),
        }
    }
}

/// Staged entries whose value differs from `live`.
///
/// A staged key missing from `live` always counts as a change.
pub fn diff_pending(live: &AttributeSet, staged: &AttributeSet) -> AttributeSet {
    staged
        .iter()
        .filter(|(key, value)| live.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Fetch the staged settings of `bios` and diff them against its live
/// attributes.
///
/// Reads the settings object the BMC advertises, or the derived staging
/// path when it advertises none.
pub async fn pending_changes(
    session: &dyn Session,
    bios: &Bios,
    layout: &StagingLayout,
) -> HostResult<AttributeSet> {
    let path = layout.settings_path(bios);
    pending_changes_at(session, bios, &path, layout).await
}

/// Diff the staged document at `path` against the live attributes of `bios`
pub async fn pending_changes_at(
    session: &dyn Session,
    bios: &Bios,
    path: &str,
    layout: &StagingLayout,
) -> HostResult<AttributeSet> {
    tracing::debug!(host = session.host(), path, "reading staged settings");

    let staged = session.get(path).await?;
    let staged = layout.extract(&staged)?;
    Ok(diff_pending(&bios.attributes, &staged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn set(value: Value) -> AttributeSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_diff_keeps_only_changes() {
        let live = set(json!({ "A": 1, "B": 2 }));
        let staged = set(json!({ "A": 1, "B": 3, "C": 4 }));

        assert_eq!(diff_pending(&live, &staged), set(json!({ "B": 3, "C": 4 })));
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let live = set(json!({ "A": 1, "B": "Enabled" }));
        assert!(diff_pending(&live, &live.clone()).is_empty());
    }

    #[test]
    fn test_diff_is_type_sensitive() {
        let live = set(json!({ "VTdSupport": 1 }));
        let staged = set(json!({ "VTdSupport": "1" }));
        assert_eq!(diff_pending(&live, &staged).len(), 1);
    }

    #[test]
    fn test_staging_path() {
        let layout = StagingLayout::default();
        assert_eq!(
            layout.staging_path("/redfish/v1/Systems/Self/Bios/"),
            "/redfish/v1/Systems/Self/Bios/Settings"
        );
    }

    #[test]
    fn test_settings_path_prefers_annotation() {
        let layout = StagingLayout::default();
        let plain: Bios = serde_json::from_value(json!({ "@odata.id": "/redfish/v1/Systems/1/Bios" })).unwrap();
        assert_eq!(layout.settings_path(&plain), "/redfish/v1/Systems/1/Bios/Settings");

        let annotated: Bios = serde_json::from_value(json!({
            "@odata.id": "/redfish/v1/Systems/1/Bios",
            "@Redfish.Settings": { "SettingsObject": { "@odata.id": "/redfish/v1/Systems/1/Bios/SD" } }
        }))
        .unwrap();
        assert_eq!(layout.settings_path(&annotated), "/redfish/v1/Systems/1/Bios/SD");
    }

    #[test]
    fn test_missing_or_null_container_is_unsupported() {
        let layout = StagingLayout::default();

        let err = layout.extract(&json!({ "@odata.id": "x" })).unwrap_err();
        assert!(err.is_unsupported());

        let err = layout.extract(&json!({ "Attributes": null })).unwrap_err();
        assert!(err.is_unsupported());

        let err = layout.extract(&json!({ "Attributes": [1, 2] })).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_candidate_keys_in_order() {
        let layout = StagingLayout {
            suffix: "SD".to_string(),
            container_keys: vec!["Attributes".to_string(), "PendingAttributes".to_string()],
        };
        let staged = json!({ "Attributes": null, "PendingAttributes": { "Sriov": "Enabled" } });

        assert_eq!(layout.extract(&staged).unwrap(), set(json!({ "Sriov": "Enabled" })));
    }
}
