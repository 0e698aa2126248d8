//! In-process stub of the notes backend for integration tests.
//!
//! Serves the same routes as the real API from an in-memory store, bound to
//! a random local port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Token the stub accepts.
pub const VALID_TOKEN: &str = "test-token";

/// A file received by the upload endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct Store {
    notes: Vec<Value>,
    next_id: i64,
    uploads: Vec<ReceivedUpload>,
}

struct StubState {
    store: Mutex<Store>,
    base_url: String,
}

type Shared = Arc<StubState>;
type Rejection = (StatusCode, Json<Value>);

/// Running stub server. Aborted on drop.
pub struct StubServer {
    pub addr: SocketAddr,
    /// Base URL including the `/api` prefix
    pub base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.store.lock().unwrap().uploads.clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a stub backend on a random port.
pub async fn spawn_stub() -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let state = Arc::new(StubState {
        store: Mutex::new(Store {
            next_id: 1,
            ..Store::default()
        }),
        base_url: format!("http://{}", addr),
    });

    let app = Router::new()
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/{id}", put(update_note).delete(delete_note))
        .route("/api/upload", post(upload))
        .route("/api/user/subscription-status", get(subscription_status))
        .route("/api/config/{name}", get(public_config))
        .with_state(Arc::clone(&state));

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server failed");
    });

    StubServer {
        addr,
        base_url: format!("http://{}/api", addr),
        state,
        handle,
    }
}

/// A request captured by the fixed-response stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Stub that answers every request with the same status and body.
pub struct FixedServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl FixedServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for FixedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_fixed(status: StatusCode, body: &'static str) -> FixedServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let requests = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&requests);
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, request_body: String| {
            let recorded = Arc::clone(&recorded);
            async move {
                recorded.lock().unwrap().push(RecordedRequest {
                    method: method.to_string(),
                    path: uri.path().to_string(),
                    authorization: headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    body: request_body,
                });
                (status, [("content-type", "application/json")], body)
            }
        },
    );

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixed server failed");
    });

    FixedServer {
        base_url: format!("http://{}/api", addr),
        requests,
        handle,
    }
}

/// An address nothing listens on.
pub async fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get local addr");
    drop(listener);
    format!("http://{}/api", addr)
}

// ============================================================================
// Handlers
// ============================================================================

fn authorize(headers: &HeaderMap) -> Result<(), Rejection> {
    let expected = format!("Bearer {}", VALID_TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        Some(_) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid token"})),
        )),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "No token provided"})),
        )),
    }
}

fn note_fields(body: &Value) -> Result<(String, String, Value, Value), Rejection> {
    let title = body["title"].as_str().unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Title is required"})),
        ));
    }
    let content = body["content"].as_str().unwrap_or_default().to_string();
    Ok((
        title,
        content,
        body.get("file_url").cloned().unwrap_or(Value::Null),
        body.get("file_name").cloned().unwrap_or(Value::Null),
    ))
}

async fn list_notes(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Rejection> {
    authorize(&headers)?;
    let store = state.store.lock().unwrap();
    Ok(Json(Value::Array(store.notes.clone())))
}

async fn create_note(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Response, Rejection> {
    authorize(&headers)?;
    let (title, content, file_url, file_name) = note_fields(&body)?;

    let mut store = state.store.lock().unwrap();
    let id = store.next_id;
    store.next_id += 1;
    let note = json!({
        "id": id,
        "title": title,
        "content": content,
        "user_id": "user-1",
        "user_email": "user@example.com",
        "created_at": format!("2024-01-01T00:00:{:02}Z", id % 60),
        "file_url": file_url,
        "file_name": file_name,
    });
    // Newest first, like the real backend
    store.notes.insert(0, note.clone());
    Ok((StatusCode::CREATED, Json(note)).into_response())
}

async fn update_note(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Rejection> {
    authorize(&headers)?;
    let (title, content, file_url, file_name) = note_fields(&body)?;

    let mut store = state.store.lock().unwrap();
    let note = store
        .notes
        .iter_mut()
        .find(|n| n["id"] == id)
        .ok_or((StatusCode::NOT_FOUND, Json(json!({"error": "Note not found"}))))?;
    note["title"] = json!(title);
    note["content"] = json!(content);
    note["file_url"] = file_url;
    note["file_name"] = file_name;
    Ok(Json(note.clone()))
}

async fn delete_note(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, Rejection> {
    authorize(&headers)?;
    let mut store = state.store.lock().unwrap();
    let before = store.notes.len();
    store.notes.retain(|n| n["id"] != id);
    if store.notes.len() == before {
        return Err((StatusCode::NOT_FOUND, Json(json!({"error": "Note not found"}))));
    }
    Ok(Json(json!({"message": "Note deleted"})))
}

async fn upload(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, Rejection> {
    authorize(&headers)?;
    let bad_request = |msg: String| (StatusCode::BAD_REQUEST, Json(json!({"error": msg})));

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;

        if field_name != "file" {
            continue;
        }
        let received = ReceivedUpload {
            field: field_name,
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        };
        let file_name = received.file_name.clone().unwrap_or_else(|| "upload.bin".to_string());
        let mut store = state.store.lock().unwrap();
        store.uploads.push(received);
        let file_url = format!("{}/files/{}-{}", state.base_url, store.uploads.len(), file_name);
        return Ok(Json(json!({"fileUrl": file_url, "fileName": file_name})));
    }

    Err(bad_request("No file uploaded".to_string()))
}

async fn subscription_status(headers: HeaderMap) -> Result<Json<Value>, Rejection> {
    authorize(&headers)?;
    Ok(Json(json!({
        "is_premium": true,
        "subscription_status": "active",
        "plan_name": "Pro Monthly",
        "expires_at": "2025-01-01T00:00:00Z"
    })))
}

async fn public_config(Path(name): Path<String>) -> Result<Json<Value>, Rejection> {
    match name.as_str() {
        "firebase" => Ok(Json(json!({
            "apiKey": "public-api-key",
            "authDomain": "notes.example.com",
            "projectId": "notes-app"
        }))),
        _ => Err((StatusCode::NOT_FOUND, Json(json!({"error": "Unknown config"})))),
    }
}
