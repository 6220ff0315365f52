//! Credential resolution
//!
//! One username/password pair applies to every host unless the host has
//! its own entry.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Environment variable holding the username
pub const USERNAME_ENV: &str = "USERNAME";
/// Environment variables holding the password, in lookup order
pub const PASSWORD_ENVS: [&str; 2] = ["IPMI_PASSWORD", "PASSWORD"];

/// A username/password pair
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Fleet-wide default credentials plus per-host overrides
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    default: Credentials,
    per_host: HashMap<String, Credentials>,
}

impl CredentialStore {
    pub fn new(default: Credentials) -> Self {
        Self {
            default,
            per_host: HashMap::new(),
        }
    }

    /// Override credentials for one host
    pub fn with_host(mut self, host: impl Into<String>, credentials: Credentials) -> Self {
        self.per_host.insert(host.into(), credentials);
        self
    }

    /// Replace default fields with values found through `lookup`.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(username) = present(USERNAME_ENV) {
            self.default.username = username;
        }
        if let Some(password) = PASSWORD_ENVS.iter().find_map(|&name| present(name)) {
            self.default.password = password;
        }
        self
    }

    /// Credentials for `host`
    pub fn resolve(&self, host: &str) -> Result<Credentials> {
        let credentials = self.per_host.get(host).unwrap_or(&self.default);
        if credentials.is_complete() {
            Ok(credentials.clone())
        } else {
            Err(ClientError::MissingCredentials(host.to_string()))
        }
    }
}
