//! Fire-and-forget commands
//!
//! Power actions have nothing to report beyond "sent" or the error. The
//! [`ActionReport`] renders one line per host and maps the batch onto a
//! process exit status.

use std::future::Future;

use fleetfish_core::{FleetReport, HostOutcome, HostResult, HostSet};

use crate::dispatcher::{dispatch, DispatchOptions};

/// Outcome of a fire-and-forget batch
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    report: FleetReport<()>,
}

impl ActionReport {
    pub fn new(report: FleetReport<()>) -> Self {
        Self { report }
    }

    /// `0` if every host accepted the command, `1` otherwise
    pub fn exit_code(&self) -> i32 {
        if self.report.all_succeeded() {
            0
        } else {
            1
        }
    }

    /// One line per host; successes first, then failures, each in host order
    pub fn lines(&self) -> Vec<String> {
        let sent = self
            .report
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .map(|(host, _)| format!("[{}]: command sent", host));
        let failed = self
            .report
            .failures()
            .map(|(host, error)| format!("[{}] {}", host, error));
        sent.chain(failed).collect()
    }

    pub fn report(&self) -> &FleetReport<()> {
        &self.report
    }

    pub fn into_report(self) -> FleetReport<()> {
        self.report
    }
}

impl FromIterator<(String, HostOutcome<()>)> for ActionReport {
    fn from_iter<I: IntoIterator<Item = (String, HostOutcome<()>)>>(iter: I) -> Self {
        let mut report = FleetReport::new();
        for (host, outcome) in iter {
            report.record(host, outcome);
        }
        Self { report }
    }
}

/// Send a command to every host and collect which ones failed
pub async fn send<F, Fut>(hosts: &HostSet, options: &DispatchOptions, handler: F) -> ActionReport
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = HostResult<()>> + Send + 'static,
{
    ActionReport::new(dispatch(hosts, options, handler).await)
}
