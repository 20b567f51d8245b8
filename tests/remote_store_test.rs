//! Integration tests for the remote record store.
//!
//! A small axum application stands in for the hosted record service. It keeps
//! records as raw JSON per kind so tests can also plant malformed rows.

#![cfg(feature = "remote")]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use catering_kit::model::{Event, EventStatus, MenuCategory, MenuItem, MenuItemPatch};
use catering_kit::store::remote::{PROJECT_HEADER, PUBLIC_KEY_HEADER};
use catering_kit::store::{RemoteConfig, RemoteStore};
use catering_kit::{Error, RecordStore};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Once};

const PROJECT: &str = "catering-test";
const KEY: &str = "pk_test";

#[derive(Default)]
struct MockState {
    records: HashMap<String, BTreeMap<i64, Value>>,
    next_id: i64,
    outage: bool,
    requests: Vec<(String, Value)>,
}

type Shared = Arc<Mutex<MockState>>;

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Reject requests without the expected credentials, or during an outage.
fn gate(state: &MockState, headers: &HeaderMap) -> Option<Response> {
    if state.outage {
        return Some(reply(StatusCode::SERVICE_UNAVAILABLE, json!({ "success": false })));
    }
    let project = headers.get(PROJECT_HEADER).and_then(|v| v.to_str().ok());
    let key = headers.get(PUBLIC_KEY_HEADER).and_then(|v| v.to_str().ok());
    if project != Some(PROJECT) || key != Some(KEY) {
        return Some(reply(
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "message": "bad credentials" }),
        ));
    }
    None
}

async fn fetch(
    State(state): State<Shared>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().expect("mock state poisoned");
    if let Some(rejection) = gate(&state, &headers) {
        return rejection;
    }
    state.requests.push((format!("{}/fetch", kind), body));
    let rows: Vec<Value> = state
        .records
        .get(&kind)
        .map(|rows| rows.values().cloned().collect())
        .unwrap_or_default();
    reply(StatusCode::OK, json!({ "success": true, "data": rows }))
}

async fn get_one(
    State(state): State<Shared>,
    Path((kind, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    let state = state.lock().expect("mock state poisoned");
    if let Some(rejection) = gate(&state, &headers) {
        return rejection;
    }
    match state.records.get(&kind).and_then(|rows| rows.get(&id)) {
        Some(row) => reply(StatusCode::OK, json!({ "success": true, "data": row })),
        None => reply(
            StatusCode::NOT_FOUND,
            json!({ "success": false, "message": "record not found" }),
        ),
    }
}

async fn create(
    State(state): State<Shared>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().expect("mock state poisoned");
    if let Some(rejection) = gate(&state, &headers) {
        return rejection;
    }
    let mut row = body["records"][0].clone();
    if row.get("Id").is_some() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "Id is assigned by the store" }),
        );
    }
    if kind == "menu_item" && row["Name"] == "Forbidden" {
        return reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "success": false, "message": "name is reserved" }),
        );
    }

    state.next_id += 1;
    let id = state.next_id;
    row["Id"] = json!(id);
    state
        .records
        .entry(kind)
        .or_default()
        .insert(id, row.clone());
    reply(
        StatusCode::OK,
        json!({ "success": true, "results": [{ "success": true, "data": row }] }),
    )
}

async fn update(
    State(state): State<Shared>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().expect("mock state poisoned");
    if let Some(rejection) = gate(&state, &headers) {
        return rejection;
    }
    state.requests.push((format!("{}/update", kind), body.clone()));
    let row = body["records"][0].clone();
    let id = row["Id"].as_i64().unwrap_or_default();
    let rows = state.records.entry(kind).or_default();
    if !rows.contains_key(&id) {
        return reply(
            StatusCode::OK,
            json!({ "success": true, "results": [{ "success": false, "message": "no such record" }] }),
        );
    }
    rows.insert(id, row.clone());
    reply(
        StatusCode::OK,
        json!({ "success": true, "results": [{ "success": true, "data": row }] }),
    )
}

async fn delete(
    State(state): State<Shared>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().expect("mock state poisoned");
    if let Some(rejection) = gate(&state, &headers) {
        return rejection;
    }
    let id = body["RecordIds"][0].as_i64().unwrap_or_default();
    let removed = state
        .records
        .get_mut(&kind)
        .and_then(|rows| rows.remove(&id))
        .is_some();
    reply(
        StatusCode::OK,
        json!({ "success": true, "results": [{ "success": removed }] }),
    )
}

async fn health(State(state): State<Shared>) -> StatusCode {
    if state.lock().expect("mock state poisoned").outage {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Start the mock service on an ephemeral port and return its base URL.
async fn start_mock() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(MockState::default()));
    let app = Router::new()
        .route("/records/{kind}/fetch", post(fetch))
        .route("/records/{kind}/get/{id}", post(get_one))
        .route("/records/{kind}/create", post(create))
        .route("/records/{kind}/update", post(update))
        .route("/records/{kind}/delete", post(delete))
        .route("/health", get(health))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), state)
}

/// Logger that keeps error-level messages for assertions.
struct ErrorCapture {
    lines: Mutex<Vec<String>>,
}

impl log::Log for ErrorCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Error
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.lines
                .lock()
                .expect("capture poisoned")
                .push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static CAPTURE: ErrorCapture = ErrorCapture {
    lines: Mutex::new(Vec::new()),
};

fn capture_errors() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Error);
    });
}

/// Captured error lines mentioning `needle`; each mock has its own port.
fn errors_mentioning(needle: &str) -> Vec<String> {
    CAPTURE
        .lines
        .lock()
        .expect("capture poisoned")
        .iter()
        .filter(|line| line.contains(needle))
        .cloned()
        .collect()
}

fn store<T: catering_kit::Record>(base_url: &str) -> RemoteStore<T> {
    RemoteStore::new(RemoteConfig::new(base_url, PROJECT, KEY)).expect("Failed to build store")
}

/// Test 1: Create assigns an id server-side and reads back equal.
#[tokio::test]
async fn test_create_and_fetch() {
    let (base_url, _state) = start_mock().await;
    let items = store::<MenuItem>(&base_url);

    let created = items
        .create(MenuItem::new("Tomato Soup", MenuCategory::Appetizers, Decimal::new(650, 2)))
        .await
        .expect("Failed to create");
    assert_eq!(created.id, 1);

    let fetched = items.fetch_by_id(created.id).await.expect("Failed to fetch");
    assert_eq!(fetched, created);
}

/// Test 2: Fetch-all sends the schema fields and sorts canonically.
#[tokio::test]
async fn test_fetch_all_sorted_with_field_list() {
    let (base_url, state) = start_mock().await;
    let events = store::<Event>(&base_url);

    for (title, month) in [("Brunch", 2), ("Gala", 9), ("Wedding", 5)] {
        let date = Utc
            .with_ymd_and_hms(2024, month, 1, 18, 0, 0)
            .single()
            .expect("valid date");
        events
            .create(Event::new(title, date, "Hall", 20))
            .await
            .expect("Failed to create");
    }

    let all = events.fetch_all().await.expect("Failed to fetch all");
    let titles: Vec<&str> = all.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Gala", "Wedding", "Brunch"]);

    let state = state.lock().expect("mock state poisoned");
    let (action, body) = state.requests.last().expect("request recorded");
    assert_eq!(action, "event/fetch");
    assert_eq!(body["fields"][0], "Id");
    assert_eq!(body["orderBy"][0]["fieldName"], "date");
    assert_eq!(body["orderBy"][0]["sorttype"], "DESC");
}

/// Test 3: Missing records surface as NotFound for get and delete.
#[tokio::test]
async fn test_missing_record_not_found() {
    let (base_url, _state) = start_mock().await;
    let items = store::<MenuItem>(&base_url);

    let err = items.fetch_by_id(42).await.expect_err("missing");
    assert!(matches!(err, Error::NotFound { kind: "menu_item", id: 42 }));

    let err = items.delete(42).await.expect_err("missing");
    assert!(err.is_not_found());
}

/// Test 4: Update merges the patch locally and writes the full record.
#[tokio::test]
async fn test_update_writes_full_record() {
    let (base_url, state) = start_mock().await;
    let items = store::<MenuItem>(&base_url);
    let created = items
        .create(
            MenuItem::new("Quiche", MenuCategory::Breakfast, Decimal::new(12, 0))
                .with_description("Leek and gruyere"),
        )
        .await
        .expect("Failed to create");

    let patch = MenuItemPatch {
        price: Some(Decimal::new(14, 0)),
        ..Default::default()
    };
    let updated = items
        .update(created.id, &patch)
        .await
        .expect("Failed to update");

    assert_eq!(updated.price, Decimal::new(14, 0));
    assert_eq!(updated.description, "Leek and gruyere");

    let state = state.lock().expect("mock state poisoned");
    let (_, body) = state.requests.last().expect("request recorded");
    assert_eq!(body["records"][0]["Id"], created.id);
    assert_eq!(body["records"][0]["description"], "Leek and gruyere");
}

/// Test 5: Server-side rejections map to ValidationError.
#[tokio::test]
async fn test_rejected_write_is_validation_error() {
    let (base_url, _state) = start_mock().await;
    let items = store::<MenuItem>(&base_url);

    let err = items
        .create(MenuItem::new("Forbidden", MenuCategory::Sides, Decimal::ONE))
        .await
        .expect_err("rejected");
    match err {
        Error::ValidationError(message) => assert_eq!(message, "name is reserved"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

/// Test 6: Malformed stored rows are rejected by the schema check.
#[tokio::test]
async fn test_malformed_row_rejected() {
    let (base_url, state) = start_mock().await;
    state
        .lock()
        .expect("mock state poisoned")
        .records
        .entry("event".to_string())
        .or_default()
        .insert(
            7,
            json!({ "Id": 7, "title": "Gala", "status": "exploded", "guest_count": 10 }),
        );

    let events = store::<Event>(&base_url);
    let err = events.fetch_by_id(7).await.expect_err("malformed");
    assert!(matches!(err, Error::ValidationError(_)));
}

/// Test 7: Outages and bad credentials are StoreUnavailable.
#[tokio::test]
async fn test_unavailable_store() {
    let (base_url, state) = start_mock().await;
    let events = store::<Event>(&base_url);
    assert!(events.health_check().await.expect("health check"));

    state.lock().expect("mock state poisoned").outage = true;
    let err = events.fetch_all().await.expect_err("outage");
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(!events.health_check().await.expect("health check"));

    state.lock().expect("mock state poisoned").outage = false;
    let intruder = RemoteStore::<Event>::new(RemoteConfig::new(&base_url, PROJECT, "wrong"))
        .expect("Failed to build store");
    assert!(matches!(
        intruder.fetch_all().await,
        Err(Error::StoreUnavailable(_))
    ));
}

/// Test 8: An unreachable host is StoreUnavailable, not a panic.
#[tokio::test]
async fn test_unreachable_host() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local addr");
    drop(listener);

    let events = store::<Event>(&format!("http://{}", addr));
    let err = events.fetch_all().await.expect_err("unreachable");
    assert!(matches!(err, Error::StoreUnavailable(_)));
    assert!(!events.health_check().await.expect("health check"));
}

/// Test 9: Status changes round-trip through the remote service.
#[tokio::test]
async fn test_event_status_update() {
    let (base_url, _state) = start_mock().await;
    let events = store::<Event>(&base_url);
    let date = Utc
        .with_ymd_and_hms(2024, 10, 12, 17, 0, 0)
        .single()
        .expect("valid date");
    let created = events
        .create(Event::new("Harvest Dinner", date, "Barn", 60))
        .await
        .expect("Failed to create");

    let updated = events
        .update(created.id, &catering_kit::model::EventPatch::status(EventStatus::Confirmed))
        .await
        .expect("Failed to update");

    assert_eq!(updated.status, EventStatus::Confirmed);
    assert_eq!(updated.date, date);
    assert_eq!(events.count().await.expect("Failed to count"), 1);
}

/// Test 10: Not-found and rejected responses are logged at error level.
#[tokio::test]
async fn test_client_errors_are_logged() {
    capture_errors();
    let (base_url, _state) = start_mock().await;
    let items = store::<MenuItem>(&base_url);

    items.fetch_by_id(7).await.expect_err("missing");
    let missing = errors_mentioning(&format!("{}/records/menu_item/get/7", base_url));
    assert_eq!(missing.len(), 1);
    assert!(missing[0].contains("404"));

    items
        .create(MenuItem::new("Forbidden", MenuCategory::Sides, Decimal::ONE))
        .await
        .expect_err("rejected");
    let rejected = errors_mentioning(&format!("{}/records/menu_item/create", base_url));
    assert_eq!(rejected.len(), 1);
    assert!(rejected[0].contains("422"));
    assert!(rejected[0].contains("name is reserved"));
}
