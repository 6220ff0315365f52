//! Redfish HTTP session implementation

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fleetfish_core::{paths, HostResult, Session};
use reqwest::header::LOCATION;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::credentials::Credentials;
use crate::error::{ClientError, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying a Redfish session token
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// How requests authenticate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// HTTP basic auth on every request
    #[default]
    Basic,
    /// Redfish session token, logged out afterwards
    Session,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthMode::Basic),
            "session" => Ok(AuthMode::Session),
            other => Err(format!("unknown auth mode {:?}, expected basic or session", other)),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Basic => f.write_str("basic"),
            AuthMode::Session => f.write_str("session"),
        }
    }
}

/// Transport settings shared by every host
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Skip TLS certificate verification
    pub insecure: bool,
    pub auth: AuthMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            insecure: false,
            auth: AuthMode::Basic,
        }
    }
}

impl ClientConfig {
    /// Build the shared HTTP client
    pub fn build_http(&self) -> Result<Client> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(self.insecure)
            .build()?;
        Ok(client)
    }
}

#[derive(Debug)]
enum SessionAuth {
    Basic(Credentials),
    Token { token: String, location: String },
}

/// An authenticated session with one BMC
#[derive(Debug)]
pub struct RedfishSession {
    host: String,
    client: Client,
    base_url: Url,
    auth: SessionAuth,
    logged_out: AtomicBool,
}

/// Redfish error body: `{"error": {"message": .., "@Message.ExtendedInfo": [..]}}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "@Message.ExtendedInfo")]
    extended_info: Vec<ExtendedInfo>,
}

#[derive(Debug, Deserialize)]
struct ExtendedInfo {
    #[serde(default, rename = "Message")]
    message: Option<String>,
}

impl RedfishSession {
    /// Authenticate against `base_url` and return the session.
    ///
    /// Basic mode checks the credentials with a GET of the service root;
    /// session mode creates a session and keeps its token.
    #[instrument(skip(client, credentials))]
    pub async fn open(
        host: &str,
        client: Client,
        base_url: Url,
        credentials: Credentials,
        mode: AuthMode,
    ) -> Result<Self> {
        let mut session = Self {
            host: host.to_string(),
            client,
            base_url,
            auth: SessionAuth::Basic(credentials),
            logged_out: AtomicBool::new(false),
        };

        match mode {
            AuthMode::Basic => {
                session.send(Method::GET, paths::SERVICE_ROOT, None).await?;
            }
            AuthMode::Session => {
                let auth = session.create_token().await?;
                session.auth = auth;
            }
        }
        debug!(host, %mode, "authenticated");
        Ok(session)
    }

    async fn create_token(&self) -> Result<SessionAuth> {
        let SessionAuth::Basic(credentials) = &self.auth else {
            return Err(ClientError::SessionError("session already established".into()));
        };

        let url = self.base_url.join(paths::SESSIONS)?;
        let body = json!({ "UserName": credentials.username, "Password": credentials.password });
        let response = self.client.post(url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(extract_error_from_status(response, status).await);
        }

        let token = header_value(&response, AUTH_TOKEN_HEADER)
            .ok_or_else(|| ClientError::SessionError("no X-Auth-Token in session response".into()))?;
        let location = header_value(&response, LOCATION.as_str());

        let location = match location {
            Some(location) => location,
            None => {
                let doc: Value = response
                    .json()
                    .await
                    .map_err(|e| ClientError::ParseError(e.to_string()))?;
                doc.get("@odata.id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| ClientError::SessionError("session has no location".into()))?
            }
        };

        Ok(SessionAuth::Token { token, location })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            SessionAuth::Basic(credentials) => {
                request.basic_auth(&credentials.username, Some(&credentials.password))
            }
            SessionAuth::Token { token, .. } => request.header(AUTH_TOKEN_HEADER, token),
        }
    }

    #[instrument(level = "debug", skip(self, body), fields(host = %self.host))]
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.base_url.join(path)?;
        let mut request = self.authorize(self.client.request(method, url));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        handle_response(response).await
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();

    if status.is_success() {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ClientError::ParseError(e.to_string()))
    } else {
        Err(extract_error_from_status(response, status).await)
    }
}

async fn extract_error_from_status(response: reqwest::Response, status: StatusCode) -> ClientError {
    let message = match response.json::<ErrorResponse>().await {
        Ok(err) => err
            .error
            .extended_info
            .into_iter()
            .find_map(|info| info.message)
            .or(err.error.message)
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ClientError::Timeout,
        _ => ClientError::server_error(status.as_u16(), message),
    }
}

#[async_trait]
impl Session for RedfishSession {
    fn host(&self) -> &str {
        &self.host
    }

    async fn get(&self, path: &str) -> HostResult<Value> {
        Ok(self.send(Method::GET, path, None).await?)
    }

    async fn patch(&self, path: &str, body: &Value) -> HostResult<Value> {
        Ok(self.send(Method::PATCH, path, Some(body)).await?)
    }

    async fn post(&self, path: &str, body: &Value) -> HostResult<Value> {
        Ok(self.send(Method::POST, path, Some(body)).await?)
    }

    async fn logout(&self) -> HostResult<()> {
        if self.logged_out.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let SessionAuth::Token { location, .. } = &self.auth {
            debug!(host = %self.host, "deleting session");
            self.send(Method::DELETE, location, None).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!("basic".parse::<AuthMode>().unwrap(), AuthMode::Basic);
        assert_eq!("Session".parse::<AuthMode>().unwrap(), AuthMode::Session);
        assert!("kerberos".parse::<AuthMode>().is_err());
        assert_eq!(AuthMode::Session.to_string(), "session");
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert!(!config.insecure);
        assert!(config.build_http().is_ok());
    }

    #[test]
    fn test_error_body_prefers_extended_info() {
        let body: ErrorResponse = serde_json::from_value(json!({
            "error": {
                "code": "Base.1.8.GeneralError",
                "message": "A general error has occurred.",
                "@Message.ExtendedInfo": [{ "Message": "The property Foo is read only." }]
            }
        }))
        .unwrap();

        assert_eq!(
            body.error.extended_info[0].message.as_deref(),
            Some("The property Foo is read only.")
        );
    }
}
