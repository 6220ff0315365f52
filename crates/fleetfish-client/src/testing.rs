//! Test utilities for fleetfish-client
//!
//! [`MockBmc`] is an in-memory Redfish service with one computer system.
//! It serves the resources the fleet commands touch, keeps BIOS writes in
//! a staging object, tracks sessions, and can be told to misbehave.
//! [`TestServer`] binds any axum router on a free local port.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

use crate::error::Result;

const SYSTEM: &str = "/redfish/v1/Systems/1";
const BIOS: &str = "/redfish/v1/Systems/1/Bios";
const MANAGER: &str = "/redfish/v1/Managers/1";
const SESSIONS: &str = "/redfish/v1/SessionService/Sessions";

#[derive(Debug, Clone)]
struct BmcState {
    manufacturer: String,
    model: String,
    cpu_model: String,
    bios_version: String,
    firmware_version: String,
    power_state: String,
    attributes: Map<String, Value>,
    /// Last path segment of the advertised BIOS settings object
    settings_object: String,
    /// `None` when the firmware has no usable staging container
    staged: Option<Map<String, Value>>,
    boot_order: Vec<String>,
    /// `None` when the BMC has no BootOptions collection
    boot_options: Option<BTreeMap<String, String>>,
    boot: Map<String, Value>,
    resets: Vec<String>,
    reject_auth: bool,
    fail_resets: bool,
    latency: Option<Duration>,
    /// token -> session id
    sessions: HashMap<String, u32>,
    next_session: u32,
    sessions_opened: usize,
}

type Shared = Arc<Mutex<BmcState>>;

fn to_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// In-memory Redfish BMC
#[derive(Debug, Clone)]
pub struct MockBmc {
    state: Shared,
}

impl MockBmc {
    /// A BMC reporting `manufacturer` with processors of `cpu_model`
    pub fn new(manufacturer: &str, cpu_model: &str) -> Self {
        let mut boot_options = BTreeMap::new();
        boot_options.insert("0001".to_string(), "UEFI PXE IPv4 ".to_string());
        boot_options.insert("0002".to_string(), "UEFI Hard Drive".to_string());

        let state = BmcState {
            manufacturer: manufacturer.to_string(),
            model: "Mock Server".to_string(),
            cpu_model: cpu_model.to_string(),
            bios_version: "1.0.0".to_string(),
            firmware_version: "2.0.0".to_string(),
            power_state: "On".to_string(),
            attributes: Map::new(),
            settings_object: "Settings".to_string(),
            staged: Some(Map::new()),
            boot_order: vec!["Boot0001".to_string(), "Boot0002".to_string()],
            boot_options: Some(boot_options),
            boot: Map::new(),
            resets: Vec::new(),
            reject_auth: false,
            fail_resets: false,
            latency: None,
            sessions: HashMap::new(),
            next_session: 1,
            sessions_opened: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// GIGABYTE board with AMD EPYC Rome processors
    pub fn gigabyte_rome() -> Self {
        Self::new("GIGABYTE", "AMD EPYC 7702 64-Core Processor").with_attributes(json!({
            "Rome0039": "Auto",
            "Rome0059": "Auto",
            "Rome0162": "Auto",
            "Rome0565": "Disabled",
            "PCIS007": "Disabled",
            "Rome0001": "Enabled"
        }))
    }

    /// HPE server with AMD processors
    pub fn hpe() -> Self {
        Self::new("HPE", "AMD EPYC 7763 64-Core Processor").with_attributes(json!({
            "ProcAmdVirtualization": "Disabled",
            "ProcAmdIOMMU": "Disabled",
            "Sriov": "Disabled",
            "ProcX2Apic": "Auto",
            "WorkloadProfile": "GeneralPowerEfficientCompute"
        }))
    }

    /// Intel board
    pub fn intel() -> Self {
        Self::new("Intel Corporation", "Intel(R) Xeon(R) Gold 6248 CPU @ 2.50GHz").with_attributes(json!({
            "VTdSupport": 0,
            "SRIOVEnable": 0,
            "ProcessorX2apic": 0,
            "ProcessorVmxEnable": 0
        }))
    }

    pub fn with_attributes(self, attributes: Value) -> Self {
        self.state.lock().attributes = to_map(attributes);
        self
    }

    pub fn with_staged(self, staged: Value) -> Self {
        self.state.lock().staged = Some(to_map(staged));
        self
    }

    /// Advertise the BIOS settings object at `Bios/<name>`
    pub fn with_settings_object(self, name: &str) -> Self {
        self.state.lock().settings_object = name.to_string();
        self
    }

    /// Report `target` as the current boot override
    pub fn with_boot_override(self, target: &str) -> Self {
        self.state
            .lock()
            .boot
            .insert("BootSourceOverrideTarget".into(), json!(target));
        self
    }

    /// Staging object exists but has no `Attributes`
    pub fn without_staging(self) -> Self {
        self.state.lock().staged = None;
        self
    }

    pub fn without_boot_options(self) -> Self {
        self.state.lock().boot_options = None;
        self
    }

    pub fn with_power_state(self, power_state: &str) -> Self {
        self.state.lock().power_state = power_state.to_string();
        self
    }

    /// Answer every authenticated request with 401
    pub fn rejecting_credentials(self) -> Self {
        self.state.lock().reject_auth = true;
        self
    }

    /// Answer reset actions with 400
    pub fn failing_resets(self) -> Self {
        self.state.lock().fail_resets = true;
        self
    }

    /// Delay every response
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state.lock().latency = Some(latency);
        self
    }

    /// Sessions created and not yet deleted
    pub fn active_sessions(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().sessions_opened
    }

    pub fn attributes(&self) -> Value {
        Value::Object(self.state.lock().attributes.clone())
    }

    pub fn staged(&self) -> Option<Value> {
        self.state.lock().staged.clone().map(Value::Object)
    }

    pub fn power_state(&self) -> String {
        self.state.lock().power_state.clone()
    }

    /// Reset types received, in order
    pub fn resets(&self) -> Vec<String> {
        self.state.lock().resets.clone()
    }

    /// Boot properties written through PATCH
    pub fn boot_override(&self) -> Value {
        Value::Object(self.state.lock().boot.clone())
    }

    /// Build the axum router serving this BMC
    pub fn router(&self) -> Router {
        Router::new()
            .route("/redfish/v1", get(service_root))
            .route("/redfish/v1/Systems", get(systems))
            .route(SYSTEM, get(system).patch(patch_system))
            .route("/redfish/v1/Systems/1/Actions/ComputerSystem.Reset", post(reset))
            .route(BIOS, get(bios))
            .route("/redfish/v1/Systems/1/Bios/{object}", get(bios_settings).patch(patch_bios_settings))
            .route("/redfish/v1/Systems/1/BootOptions/{id}", get(boot_option))
            .route("/redfish/v1/Systems/1/Processors", get(processors))
            .route("/redfish/v1/Systems/1/Processors/{id}", get(processor))
            .route("/redfish/v1/Managers", get(managers))
            .route(MANAGER, get(manager))
            .route(SESSIONS, post(create_session))
            .route("/redfish/v1/SessionService/Sessions/{id}", delete(delete_session))
            .layer(middleware::from_fn_with_state(self.state.clone(), authenticate))
            .with_state(self.state.clone())
    }

    /// Serve this BMC on a free local port
    pub async fn serve(&self) -> Result<TestServer> {
        TestServer::start(self.router()).await
    }
}

fn redfish_error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "error": {
            "code": "Base.1.8.GeneralError",
            "message": message,
            "@Message.ExtendedInfo": [{ "Message": message }]
        }
    });
    (status, Json(body)).into_response()
}

async fn authenticate(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let latency = state.lock().latency;
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }

    let login = request.method() == Method::POST && request.uri().path() == SESSIONS;
    if !login && !authorized(&state, request.headers()) {
        return redfish_error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    next.run(request).await
}

fn authorized(state: &Shared, headers: &HeaderMap) -> bool {
    let state = state.lock();
    if state.reject_auth {
        return false;
    }
    if let Some(token) = headers.get("X-Auth-Token").and_then(|v| v.to_str().ok()) {
        return state.sessions.contains_key(token);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "))
}

async fn service_root() -> Json<Value> {
    Json(json!({
        "@odata.id": "/redfish/v1",
        "RedfishVersion": "1.8.0",
        "Systems": { "@odata.id": "/redfish/v1/Systems" },
        "Managers": { "@odata.id": "/redfish/v1/Managers" }
    }))
}

async fn systems() -> Json<Value> {
    Json(json!({ "Members": [{ "@odata.id": SYSTEM }], "Members@odata.count": 1 }))
}

async fn system(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock();
    let mut boot = state.boot.clone();
    boot.insert("BootOrder".into(), json!(state.boot_order));
    boot.insert("BootNext".into(), json!(""));

    Json(json!({
        "@odata.id": SYSTEM,
        "Id": "1",
        "Manufacturer": state.manufacturer,
        "Model": state.model,
        "BiosVersion": state.bios_version,
        "PowerState": state.power_state,
        "Boot": boot,
        "ProcessorSummary": { "Count": 2, "Model": state.cpu_model },
        "Bios": { "@odata.id": BIOS },
        "Processors": { "@odata.id": "/redfish/v1/Systems/1/Processors" }
    }))
}

async fn patch_system(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let Some(Value::Object(boot)) = body.get("Boot").cloned() else {
        return redfish_error(StatusCode::BAD_REQUEST, "only Boot can be patched");
    };
    state.lock().boot.extend(boot);
    StatusCode::NO_CONTENT.into_response()
}

async fn reset(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock();
    if state.fail_resets {
        return redfish_error(StatusCode::BAD_REQUEST, "reset not allowed in current state");
    }
    let Some(reset_type) = body.get("ResetType").and_then(Value::as_str) else {
        return redfish_error(StatusCode::BAD_REQUEST, "ResetType is required");
    };

    state.resets.push(reset_type.to_string());
    state.power_state = match reset_type {
        "ForceOff" | "GracefulShutdown" | "PushPowerButton" => "Off",
        "Nmi" => state.power_state.as_str(),
        _ => "On",
    }
    .to_string();
    StatusCode::NO_CONTENT.into_response()
}

async fn bios(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock();
    let settings = format!("{}/{}", BIOS, state.settings_object);
    Json(json!({
        "@odata.id": BIOS,
        "Attributes": state.attributes,
        "@Redfish.Settings": { "SettingsObject": { "@odata.id": settings } }
    }))
}

async fn bios_settings(State(state): State<Shared>, Path(object): Path<String>) -> Response {
    let state = state.lock();
    if object != state.settings_object {
        return redfish_error(StatusCode::NOT_FOUND, "settings object not found");
    }
    let odata_id = format!("{}/{}", BIOS, object);
    match &state.staged {
        Some(staged) => Json(json!({ "@odata.id": odata_id, "Attributes": staged })).into_response(),
        None => Json(json!({ "@odata.id": odata_id })).into_response(),
    }
}

async fn patch_bios_settings(
    State(state): State<Shared>,
    Path(object): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Some(Value::Object(attributes)) = body.get("Attributes").cloned() else {
        return redfish_error(StatusCode::BAD_REQUEST, "Attributes is required");
    };
    let mut state = state.lock();
    if object != state.settings_object {
        return redfish_error(StatusCode::NOT_FOUND, "settings object not found");
    }
    // Firmware without a staging container accepts the write and drops it
    if let Some(staged) = state.staged.as_mut() {
        staged.extend(attributes);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn boot_option(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock();
    match state.boot_options.as_ref().and_then(|options| options.get(&id)) {
        Some(description) => Json(json!({
            "@odata.id": format!("/redfish/v1/Systems/1/BootOptions/{}", id),
            "Id": id,
            "Description": description
        }))
        .into_response(),
        None => redfish_error(StatusCode::NOT_FOUND, "boot option not found"),
    }
}

async fn processors() -> Json<Value> {
    Json(json!({
        "Members": [
            { "@odata.id": "/redfish/v1/Systems/1/Processors/CPU0" },
            { "@odata.id": "/redfish/v1/Systems/1/Processors/CPU1" }
        ]
    }))
}

async fn processor(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let socket = match id.as_str() {
        "CPU0" => "P0",
        "CPU1" => "P1",
        _ => return redfish_error(StatusCode::NOT_FOUND, "processor not found"),
    };
    let state = state.lock();
    Json(json!({
        "@odata.id": format!("/redfish/v1/Systems/1/Processors/{}", id),
        "Socket": socket,
        "Model": state.cpu_model,
        "ProcessorArchitecture": "x86",
        "TotalCores": 64,
        "TotalThreads": 128,
        "ProcessorId": { "VendorId": if state.cpu_model.starts_with("AMD") { "AuthenticAMD" } else { "GenuineIntel" } }
    }))
    .into_response()
}

async fn managers() -> Json<Value> {
    Json(json!({ "Members": [{ "@odata.id": MANAGER }] }))
}

async fn manager(State(state): State<Shared>) -> Json<Value> {
    let state = state.lock();
    Json(json!({
        "@odata.id": MANAGER,
        "Model": "Mock BMC",
        "FirmwareVersion": state.firmware_version
    }))
}

async fn create_session(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock();
    let has_user = body.get("UserName").and_then(Value::as_str).is_some_and(|u| !u.is_empty());
    if state.reject_auth || !has_user {
        return redfish_error(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let id = state.next_session;
    state.next_session += 1;
    state.sessions_opened += 1;
    let token = format!("token-{}", id);
    state.sessions.insert(token.clone(), id);

    let location = format!("{}/{}", SESSIONS, id);
    let headers = [("X-Auth-Token", token), (header::LOCATION.as_str(), location.clone())];
    (
        StatusCode::CREATED,
        headers,
        Json(json!({ "@odata.id": location, "Id": id.to_string() })),
    )
        .into_response()
}

async fn delete_session(State(state): State<Shared>, Path(id): Path<u32>) -> Response {
    let mut state = state.lock();
    let before = state.sessions.len();
    state.sessions.retain(|_, session| *session != id);
    if state.sessions.len() == before {
        return redfish_error(StatusCode::NOT_FOUND, "session not found");
    }
    StatusCode::NO_CONTENT.into_response()
}

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve an axum router on `127.0.0.1` at a free port
    ///
    /// # Example
    ///
    /// ```ignore
    /// use fleetfish_client::testing::{MockBmc, TestServer};
    ///
    /// let bmc = MockBmc::gigabyte_rome();
    /// let server = TestServer::start(bmc.router()).await?;
    /// let host = server.host(); // "http://127.0.0.1:<port>"
    /// ```
    pub async fn start(router: Router) -> Result<Self> {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Host identifier that targets this server over plain HTTP
    pub fn host(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Wait for a condition with timeout
pub async fn wait_for<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    condition()
}
