//! Host-keyed aggregation of per-host outcomes
//!
//! A [`FleetReport`] holds exactly one [`HostOutcome`] per host. Failures
//! sit in the same map as successes and serialize as a structured
//! `error` object so tooling can tell them apart without parsing text:
//!
//! ```json
//! {
//!   "bmc-01": { "powerState": "On" },
//!   "bmc-02": { "error": { "kind": "connection", "message": "connection failed: ..." } }
//! }
//! ```

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::{ErrorKind, HostError, HostResult};

/// Outcome of one host's operation
#[derive(Debug, Clone, PartialEq)]
pub enum HostOutcome<T> {
    Success(T),
    Failure(HostError),
}

impl<T> HostOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, HostOutcome::Success(_))
    }

    pub fn error(&self) -> Option<&HostError> {
        match self {
            HostOutcome::Failure(e) => Some(e),
            HostOutcome::Success(_) => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            HostOutcome::Success(v) => Some(v),
            HostOutcome::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> HostResult<T> {
        match self {
            HostOutcome::Success(v) => Ok(v),
            HostOutcome::Failure(e) => Err(e),
        }
    }
}

impl<T> From<HostResult<T>> for HostOutcome<T> {
    fn from(result: HostResult<T>) -> Self {
        match result {
            Ok(v) => HostOutcome::Success(v),
            Err(e) => HostOutcome::Failure(e),
        }
    }
}

/// Wire shape of a failure entry
#[derive(Serialize)]
struct ErrorDetail {
    kind: ErrorKind,
    message: String,
}

impl<T: Serialize> Serialize for HostOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HostOutcome::Success(value) => value.serialize(serializer),
            HostOutcome::Failure(err) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(
                    "error",
                    &ErrorDetail {
                        kind: err.kind(),
                        message: err.to_string(),
                    },
                )?;
                map.end()
            }
        }
    }
}

/// Aggregated results of a fleet-wide operation, keyed by host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FleetReport<T> {
    outcomes: BTreeMap<String, HostOutcome<T>>,
}

impl<T> Default for FleetReport<T> {
    fn default() -> Self {
        Self {
            outcomes: BTreeMap::new(),
        }
    }
}

impl<T> FleetReport<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a host's outcome. Returns `false` if the host already had one;
    /// the first recorded outcome is kept.
    pub fn record(&mut self, host: impl Into<String>, outcome: impl Into<HostOutcome<T>>) -> bool {
        let host = host.into();
        if self.outcomes.contains_key(&host) {
            return false;
        }
        self.outcomes.insert(host, outcome.into());
        true
    }

    pub fn contains(&self, host: &str) -> bool {
        self.outcomes.contains_key(host)
    }

    pub fn get(&self, host: &str) -> Option<&HostOutcome<T>> {
        self.outcomes.get(host)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Iterate in host order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &HostOutcome<T>)> {
        self.outcomes.iter()
    }

    /// Hosts whose operation failed, with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&String, &HostError)> {
        self.outcomes
            .iter()
            .filter_map(|(host, outcome)| outcome.error().map(|e| (host, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    /// Transform every success value, keeping failures as they are
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> FleetReport<U> {
        FleetReport {
            outcomes: self
                .outcomes
                .into_iter()
                .map(|(host, outcome)| {
                    let outcome = match outcome {
                        HostOutcome::Success(v) => HostOutcome::Success(f(v)),
                        HostOutcome::Failure(e) => HostOutcome::Failure(e),
                    };
                    (host, outcome)
                })
                .collect(),
        }
    }
}

impl<T> IntoIterator for FleetReport<T> {
    type Item = (String, HostOutcome<T>);
    type IntoIter = std::collections::btree_map::IntoIter<String, HostOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Status {
        power_state: &'static str,
    }

    #[test]
    fn test_first_outcome_wins() {
        let mut report: FleetReport<u32> = FleetReport::new();
        assert!(report.record("a", Ok(1)));
        assert!(!report.record("a", Err(HostError::Timeout)));
        assert_eq!(report.get("a"), Some(&HostOutcome::Success(1)));
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_error_entries_are_structured() {
        let mut report = FleetReport::new();
        report.record("h1", Err(HostError::Connection("refused".into())));
        report.record("h2", Ok(Status { power_state: "On" }));

        let rendered = serde_json::to_string(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(
            parsed,
            json!({
                "h1": { "error": { "kind": "connection", "message": "connection failed: refused" } },
                "h2": { "powerState": "On" }
            })
        );
    }

    #[test]
    fn test_failures_and_map() {
        let mut report = FleetReport::new();
        report.record("a", Ok(2));
        report.record("b", Err(HostError::Cancelled));

        assert_eq!(report.failure_count(), 1);
        assert!(!report.all_succeeded());

        let doubled = report.map(|v| v * 2);
        assert_eq!(doubled.get("a").and_then(|o| o.value()), Some(&4));
        assert_eq!(doubled.get("b").and_then(|o| o.error()), Some(&HostError::Cancelled));
    }
}
