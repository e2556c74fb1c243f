#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use dcinv_api_client::{ApiClient, ClientOptions, Credentials, MemorySessionStore, RetryPolicy};

#[derive(Clone)]
pub struct MockState {
    pub valid_token: Arc<Mutex<String>>,
    pub refresh_calls: Arc<AtomicUsize>,
    pub refresh_fails: Arc<AtomicBool>,
    pub refresh_delay_ms: Arc<AtomicU64>,
    /// Requests to `GET /datacenters/{id}/` that should stall past the client timeout.
    pub slow_remaining: Arc<AtomicUsize>,
    /// Same for `POST .../send-pdf/`; the email is recorded before the stall.
    pub slow_sends: Arc<AtomicUsize>,
    pub datacenter_hits: Arc<AtomicUsize>,
    pub list_hits: Arc<AtomicUsize>,
    pub logout_calls: Arc<AtomicUsize>,
    pub logout_fails: Arc<AtomicBool>,
    pub equipment_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub lookup_response: Arc<Mutex<(u16, Value)>>,
    pub import_response: Arc<Mutex<(u16, Value)>>,
    pub import_bodies: Arc<Mutex<Vec<Vec<u8>>>>,
    pub sent_emails: Arc<Mutex<Vec<String>>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            valid_token: Arc::new(Mutex::new("access-0".to_string())),
            refresh_calls: Arc::default(),
            refresh_fails: Arc::default(),
            refresh_delay_ms: Arc::new(AtomicU64::new(50)),
            slow_remaining: Arc::default(),
            slow_sends: Arc::default(),
            datacenter_hits: Arc::default(),
            list_hits: Arc::default(),
            logout_calls: Arc::default(),
            logout_fails: Arc::default(),
            equipment_queries: Arc::default(),
            lookup_response: Arc::new(Mutex::new((200, json!(["Gold", "Silver"])))),
            import_response: Arc::new(Mutex::new((
                201,
                json!({"imported_count": 1, "error_count": 0, "errors": []}),
            ))),
            import_bodies: Arc::default(),
            sent_emails: Arc::default(),
        }
    }
}

impl MockState {
    pub fn set_valid_token(&self, token: &str) {
        *self.valid_token.lock().expect("token lock") = token.to_string();
    }
}

fn take_slow(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.valid_token.lock().expect("token lock"));
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response()
}

fn scripted(response: &Mutex<(u16, Value)>) -> Response {
    let (status, body) = response.lock().expect("scripted lock").clone();
    (
        StatusCode::from_u16(status).expect("valid status"),
        Json(body),
    )
        .into_response()
}

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    if body["password"] == "secret" {
        state.set_valid_token("access-1");
        Json(json!({"access": "access-1", "refresh": "refresh-1"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn refresh(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(delay)).await;
    let n = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if state.refresh_fails.load(Ordering::SeqCst) || body["refresh"].as_str().is_none() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired", "code": "token_not_valid"})),
        )
            .into_response();
    }
    let access = format!("access-r{n}");
    state.set_valid_token(&access);
    Json(json!({ "access": access })).into_response()
}

async fn logout(State(state): State<MockState>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    if state.logout_fails.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))).into_response();
    }
    Json(json!({"message": "Logged out successfully!"})).into_response()
}

async fn list_datacenters(State(state): State<MockState>, headers: HeaderMap) -> Response {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!([{"id": 1, "name": "DC1", "description": "Primary"}])).into_response()
}

async fn get_datacenter(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    state.datacenter_hits.fetch_add(1, Ordering::SeqCst);
    if take_slow(&state.slow_remaining) {
        tokio::time::sleep(Duration::from_millis(600)).await;
    }
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if id != 1 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "DataCenter not found"})),
        )
            .into_response();
    }
    Json(json!({"id": 1, "name": "DC1", "description": "Primary"})).into_response()
}

async fn list_equipment(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state
        .equipment_queries
        .lock()
        .expect("queries lock")
        .push(query);
    Json(json!([{
        "id": 7,
        "equipment_type": "Server",
        "service_tag": "ST-7",
        "license_type": "Gold",
        "serial_number": "SN-7",
        "license_expired_date": "2031-01-31",
        "is_expired": false,
        "datacenter": "DC1"
    }]))
    .into_response()
}

async fn license_types(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    scripted(&state.lookup_response)
}

async fn service_tags(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!(["ST-7", "ST-8"])).into_response()
}

async fn export_pdf(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    (StatusCode::OK, Bytes::from_static(b"%PDF-1.4 mock")).into_response()
}

async fn import_excel(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    state
        .import_bodies
        .lock()
        .expect("import lock")
        .push(body.to_vec());
    scripted(&state.import_response)
}

async fn send_pdf(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let email = body["email"].as_str().unwrap_or_default().to_string();
    state
        .sent_emails
        .lock()
        .expect("emails lock")
        .push(email.clone());
    if take_slow(&state.slow_sends) {
        tokio::time::sleep(Duration::from_millis(600)).await;
    }
    Json(json!({"message": format!("PDF sent successfully to {email}!")})).into_response()
}

pub async fn spawn_mock_server() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new()
        .route("/token/", post(login))
        .route("/token/refresh/", post(refresh))
        .route("/logout/", post(logout))
        .route("/datacenters/", get(list_datacenters))
        .route("/datacenters/{id}/", get(get_datacenter))
        .route("/datacenters/{id}/equipments/", get(list_equipment))
        .route(
            "/datacenters/{id}/equipments/license-types/",
            get(license_types),
        )
        .route(
            "/datacenters/{id}/equipments/service-tags/",
            get(service_tags),
        )
        .route("/datacenters/{id}/equipments/export-pdf/", get(export_pdf))
        .route(
            "/datacenters/{id}/equipments/import-excel/",
            post(import_excel),
        )
        .route("/datacenters/{id}/equipments/send-pdf/", post(send_pdf))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server listener");
    let address: SocketAddr = listener.local_addr().expect("mock listener local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("run mock server");
    });
    (format!("http://{address}"), state)
}

pub fn fast_options(base_url: &str) -> ClientOptions {
    ClientOptions {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_millis(200),
        import_timeout: Duration::from_secs(2),
        retry: RetryPolicy::new(3, Duration::from_millis(10)),
    }
}

pub fn client_with_tokens(
    base_url: &str,
    access: &str,
    refresh: Option<&str>,
) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_credentials(Credentials {
        access: access.to_string(),
        refresh: refresh.map(str::to_string),
    }));
    let client = ApiClient::new(fast_options(base_url), store.clone()).expect("build client");
    (client, store)
}

pub fn anonymous_client(base_url: &str) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::default());
    let client = ApiClient::new(fast_options(base_url), store.clone()).expect("build client");
    (client, store)
}
