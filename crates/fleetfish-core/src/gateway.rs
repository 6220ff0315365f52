//! Gateway and Session traits - the seam between fleet logic and the wire
//!
//! A [`Gateway`] knows how to authenticate against one host and hands out
//! a [`Session`]. Command handlers only ever see these traits, so they can
//! run against the Redfish HTTP client or an in-memory fake.

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HostResult;

/// An authenticated connection to one BMC
#[async_trait]
pub trait Session: Send + Sync {
    /// Host this session talks to
    fn host(&self) -> &str;

    /// GET a resource and return its JSON document
    async fn get(&self, path: &str) -> HostResult<Value>;

    /// PATCH a resource. Returns the response document, or `Value::Null`
    /// when the BMC answers without a body.
    async fn patch(&self, path: &str, body: &Value) -> HostResult<Value>;

    /// POST to a resource or action target
    async fn post(&self, path: &str, body: &Value) -> HostResult<Value>;

    /// End the session on the BMC. Idempotent.
    async fn logout(&self) -> HostResult<()>;
}

/// Opens sessions to hosts
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn connect(&self, host: &str) -> HostResult<Arc<dyn Session>>;
}

/// Owns one session for the duration of a host task.
///
/// Call [`SessionGuard::release`] (or [`SessionGuard::finish`]) on the
/// normal path. A guard dropped without release, for example because its
/// task was aborted, spawns the logout on the current runtime instead.
pub struct SessionGuard {
    session: Arc<dyn Session>,
    released: bool,
}

impl SessionGuard {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            released: false,
        }
    }

    /// Connect to `host` through `gateway` and guard the resulting session
    pub async fn open(gateway: &dyn Gateway, host: &str) -> HostResult<Self> {
        let session = gateway.connect(host).await?;
        tracing::debug!(host, "session opened");
        Ok(Self::new(session))
    }

    /// Log out and consume the guard
    pub async fn release(mut self) -> HostResult<()> {
        self.released = true;
        let result = self.session.logout().await;
        tracing::debug!(host = self.session.host(), "session released");
        result
    }

    /// Release the session and pass `result` through.
    ///
    /// A failed logout is logged but never replaces the operation's own
    /// outcome.
    pub async fn finish<T>(self, result: HostResult<T>) -> HostResult<T> {
        let host = self.session.host().to_string();
        if let Err(e) = self.release().await {
            tracing::warn!(host = %host, error = %e, "logout failed");
        }
        result
    }
}

impl Deref for SessionGuard {
    type Target = dyn Session;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let session = Arc::clone(&self.session);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = session.logout().await {
                        tracing::warn!(host = session.host(), error = %e, "deferred logout failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(host = session.host(), "session dropped outside a runtime, not logged out");
            }
        }
    }
}
