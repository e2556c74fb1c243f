#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use dcinv_api::{EquipmentDraft, EquipmentRecord};
use dcinv_api_client::{ApiClient, ClientOptions, MemorySessionStore, RetryPolicy};

pub const TOKEN: &str = "inventory-token";

/// In-memory equipment table behind the mock server.
#[derive(Clone, Default)]
pub struct Backend {
    pub records: Arc<Mutex<Vec<EquipmentRecord>>>,
    pub next_id: Arc<AtomicUsize>,
    pub list_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub add_calls: Arc<AtomicUsize>,
    pub delete_fails: Arc<AtomicBool>,
    /// Rows the next import inserts, with the report it answers.
    pub import_plan: Arc<Mutex<Option<(Vec<EquipmentDraft>, Value)>>>,
}

impl Backend {
    pub fn seed(&self, drafts: &[EquipmentDraft]) {
        for draft in drafts {
            self.insert(draft);
        }
    }

    fn insert(&self, draft: &EquipmentDraft) -> EquipmentRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        let record = EquipmentRecord {
            id,
            equipment_type: draft.equipment_type.clone(),
            service_tag: draft.service_tag.clone(),
            license_type: draft.license_type.clone(),
            serial_number: draft.serial_number.clone(),
            license_expiry_date: draft.license_expired_date,
            is_expired: false,
            datacenter: Some("DC1".into()),
        };
        self.records.lock().expect("records lock").push(record.clone());
        record
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().expect("records lock").len()
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.list_queries.lock().expect("queries lock").last().cloned()
    }
}

pub fn draft(tag: &str, license: &str, kind: &str) -> EquipmentDraft {
    EquipmentDraft {
        equipment_type: kind.into(),
        service_tag: tag.into(),
        license_type: license.into(),
        serial_number: format!("SN-{tag}"),
        license_expired_date: None,
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" && body["password"] == "secret" {
        Json(json!({"access": TOKEN, "refresh": "refresh-token"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response()
    }
}

async fn list_datacenters(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([{"id": 1, "name": "DC1", "description": ""}])).into_response()
}

async fn list_equipment(
    State(backend): State<Backend>,
    Path(_dc): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    backend
        .list_queries
        .lock()
        .expect("queries lock")
        .push(query.clone());
    let records: Vec<EquipmentRecord> = backend
        .records
        .lock()
        .expect("records lock")
        .iter()
        .filter(|r| {
            query.get("service_tag").is_none_or(|v| &r.service_tag == v)
                && query.get("license_type").is_none_or(|v| &r.license_type == v)
                && query
                    .get("equipment_type")
                    .is_none_or(|v| &r.equipment_type == v)
        })
        .cloned()
        .collect();
    Json(records).into_response()
}

async fn add_equipment(
    State(backend): State<Backend>,
    Path(_dc): Path<i64>,
    headers: HeaderMap,
    Json(draft): Json<EquipmentDraft>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    backend.add_calls.fetch_add(1, Ordering::SeqCst);
    let record = backend.insert(&draft);
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn modify_equipment(
    State(backend): State<Backend>,
    Path((_dc, id)): Path<(i64, i64)>,
    headers: HeaderMap,
    Json(draft): Json<EquipmentDraft>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut records = backend.records.lock().expect("records lock");
    let Some(record) = records.iter_mut().find(|r| r.id == id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Equipment not found"})),
        )
            .into_response();
    };
    record.equipment_type = draft.equipment_type;
    record.service_tag = draft.service_tag;
    record.license_type = draft.license_type;
    record.serial_number = draft.serial_number;
    record.license_expiry_date = draft.license_expired_date;
    Json(record.clone()).into_response()
}

async fn delete_equipment(
    State(backend): State<Backend>,
    Path((_dc, id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if backend.delete_fails.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "An error occurred"})),
        )
            .into_response();
    }
    backend
        .records
        .lock()
        .expect("records lock")
        .retain(|r| r.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn expiring(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let records: Vec<EquipmentRecord> = backend
        .records
        .lock()
        .expect("records lock")
        .iter()
        .filter(|r| r.license_expiry_date.is_some())
        .cloned()
        .collect();
    Json(records).into_response()
}

async fn import_excel(State(backend): State<Backend>, headers: HeaderMap, _body: Bytes) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let plan = backend.import_plan.lock().expect("plan lock").take();
    let Some((rows, report)) = plan else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "No file uploaded."}))).into_response();
    };
    backend.seed(&rows);
    (StatusCode::CREATED, Json(report)).into_response()
}

pub async fn spawn_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/token/", post(login))
        .route("/datacenters/", get(list_datacenters))
        .route("/datacenters/{dc}/equipments/", get(list_equipment))
        .route("/datacenters/{dc}/equipments/add/", post(add_equipment))
        .route(
            "/datacenters/{dc}/equipments/{id}/modify/",
            patch(modify_equipment),
        )
        .route(
            "/datacenters/{dc}/equipments/{id}/delete/",
            delete(delete_equipment),
        )
        .route("/datacenters/{dc}/equipments/expiring/", get(expiring))
        .route(
            "/datacenters/{dc}/equipments/import-excel/",
            post(import_excel),
        )
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind backend listener");
    let address: SocketAddr = listener.local_addr().expect("backend local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("run backend");
    });
    (format!("http://{address}"), backend)
}

pub fn client(base_url: &str) -> Arc<ApiClient> {
    let options = ClientOptions {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(2),
        import_timeout: Duration::from_secs(5),
        retry: RetryPolicy::new(3, Duration::from_millis(10)),
    };
    let store = Arc::new(MemorySessionStore::default());
    Arc::new(ApiClient::new(options, store).expect("build client"))
}
