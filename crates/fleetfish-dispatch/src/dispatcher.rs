//! Fan-out of one per-host operation across a host set
//!
//! Every host gets its own tokio task. Tasks hand their outcome back
//! through a [`JoinSet`]; the collector loop in [`dispatch_until`] is the
//! only code that writes the [`FleetReport`]. Each host ends up with
//! exactly one entry, whether its task succeeded, returned an error,
//! panicked, timed out or was cancelled.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use fleetfish_core::{FleetReport, HostError, HostResult, HostSet};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::shutdown::Shutdown;

/// Knobs for one dispatch
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Suppress the progress notice on stderr
    pub quiet: bool,
    /// Verb used in the progress notice ("querying", "updating")
    pub verb: &'static str,
    /// Cap on hosts in flight at once. `None` runs every host at once.
    pub max_in_flight: Option<usize>,
    /// Deadline for each host's whole operation
    pub host_timeout: Option<Duration>,
    /// Batch-wide cancellation
    pub shutdown: Option<Shutdown>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            quiet: false,
            verb: "querying",
            max_in_flight: None,
            host_timeout: None,
            shutdown: None,
        }
    }
}

impl DispatchOptions {
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    pub fn with_verb(mut self, verb: &'static str) -> Self {
        self.verb = verb;
        self
    }

    fn shutdown_signal(&self) -> impl Future<Output = ()> + 'static {
        let shutdown = self.shutdown.clone();
        async move {
            match shutdown {
                Some(shutdown) => shutdown.wait().await,
                None => std::future::pending().await,
            }
        }
    }
}

/// Run `handler` for every host and aggregate the results
pub async fn dispatch<T, F, Fut>(hosts: &HostSet, options: &DispatchOptions, handler: F) -> FleetReport<T>
where
    T: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = HostResult<T>> + Send + 'static,
{
    let shutdown = options.shutdown_signal();
    dispatch_until(hosts, options, handler, shutdown).await
}

/// Run `handler` for every host with its own clone of `payload`
pub async fn broadcast<T, P, F, Fut>(
    hosts: &HostSet,
    options: &DispatchOptions,
    payload: P,
    handler: F,
) -> FleetReport<T>
where
    T: Send + 'static,
    P: Clone,
    F: Fn(String, P) -> Fut,
    Fut: Future<Output = HostResult<T>> + Send + 'static,
{
    dispatch(hosts, options, |host| handler(host, payload.clone())).await
}

/// Run `handler` for every host until all finish or `shutdown` resolves.
///
/// When `shutdown` resolves first, every task still running is aborted and
/// reported as [`HostError::Cancelled`].
pub async fn dispatch_until<T, F, Fut, S>(
    hosts: &HostSet,
    options: &DispatchOptions,
    handler: F,
    shutdown: S,
) -> FleetReport<T>
where
    T: Send + 'static,
    F: Fn(String) -> Fut,
    Fut: Future<Output = HostResult<T>> + Send + 'static,
    S: Future<Output = ()>,
{
    if !options.quiet {
        eprintln!("Asynchronously {} [{:5}] hosts ... ", options.verb, hosts.len());
    }

    let limiter = options
        .max_in_flight
        .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

    let mut report = FleetReport::new();
    let mut tasks = JoinSet::new();
    for host in hosts.iter() {
        let host = host.to_string();
        // The handler runs here, on the collector's task, before any future exists
        let operation = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(host.clone()))) {
            Ok(operation) => operation,
            Err(payload) => {
                warn!(host = %host, "handler panicked before starting");
                report.record(host, Err(HostError::Panicked(panic_message(payload.as_ref()))));
                continue;
            }
        };
        let limiter = limiter.clone();
        let deadline = options.host_timeout;

        tasks.spawn(async move {
            let _permit = match limiter {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return (host, Err(HostError::Cancelled)),
                },
                None => None,
            };
            debug!(host = %host, "host task started");
            let outcome = run_isolated(operation, deadline).await;
            (host, outcome)
        });
    }

    let mut cancelled = false;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            joined = tasks.join_next() => match joined {
                Some(Ok((host, outcome))) => {
                    if let Err(e) = &outcome {
                        debug!(host = %host, error = %e, "host failed");
                    }
                    report.record(host, outcome);
                }
                Some(Err(e)) if e.is_cancelled() => {}
                Some(Err(e)) => warn!(error = %e, "host task ended without reporting"),
                None => break,
            },
            _ = &mut shutdown, if !cancelled => {
                warn!(remaining = tasks.len(), "cancelling in-flight hosts");
                cancelled = true;
                tasks.abort_all();
            }
        }
    }

    for host in hosts.iter() {
        if !report.contains(host) {
            let error = if cancelled {
                HostError::Cancelled
            } else {
                HostError::Panicked("task ended without reporting".to_string())
            };
            report.record(host, Err(error));
        }
    }

    report
}

/// Await `operation` behind a panic boundary and an optional deadline
async fn run_isolated<T, Fut>(operation: Fut, deadline: Option<Duration>) -> HostResult<T>
where
    Fut: Future<Output = HostResult<T>>,
{
    let guarded = AssertUnwindSafe(operation).catch_unwind();
    let caught = match deadline {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(caught) => caught,
            Err(_) => return Err(HostError::Timeout),
        },
        None => guarded.await,
    };
    caught.unwrap_or_else(|payload| Err(HostError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn test_run_isolated_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let outcome = run_isolated(slow, Some(Duration::from_millis(10))).await;
        assert_eq!(outcome, Err(HostError::Timeout));
    }

    #[tokio::test]
    async fn test_run_isolated_passes_errors_through() {
        let failing = async { Err::<(), _>(HostError::NotFound("Bios".into())) };
        let outcome = run_isolated(failing, None).await;
        assert_eq!(outcome, Err(HostError::NotFound("Bios".into())));
    }
}
