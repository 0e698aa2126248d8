//! HTTP implementation of the notes API.

use crate::api::NotesApi;
use crate::error::{ClientError, Result};
use crate::events::{EventBus, RequestEvent};
use crate::models::{Note, NoteDraft, NoteId, SubscriptionStatus, UploadedFile};
use crate::pending::{self, Pending};
use crate::token::TokenSlot;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Time allowed to establish a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest silence allowed while waiting for response bytes. Resets on every
/// successful read, so a slow but steady transfer is never cut off.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Multipart field the upload endpoint reads.
const UPLOAD_FIELD: &str = "file";

/// Client for the notes backend.
///
/// Cheap to clone: clones share the connection pool, the token slot and the
/// event bus. Operations never block the caller and may run concurrently;
/// no ordering is imposed between them.
#[derive(Debug, Clone)]
pub struct NotesClient {
    http: reqwest::Client,
    base_url: Url,
    token: TokenSlot,
    events: Arc<EventBus>,
}

impl NotesClient {
    /// Create a client for `base_url` (e.g. `https://host/api`).
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http_client(base_url, http_client(CONNECT_TIMEOUT, READ_TIMEOUT)?)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_http_client(base_url: &str, http: reqwest::Client) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            token: TokenSlot::new(),
            events: Arc::new(EventBus::new()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Set the bearer token used by every request issued from now on.
    pub fn set_auth_token(&self, token: impl Into<String>) {
        self.token.set(token);
    }

    pub fn clear_auth_token(&self) {
        self.token.clear();
    }

    pub fn token(&self) -> &TokenSlot {
        &self.token
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Run an operation on a worker task.
    ///
    /// ```no_run
    /// # async fn demo(client: notes_client::NotesClient) {
    /// client
    ///     .spawn(|c| async move { c.list_notes().await })
    ///     .on_complete(|outcome| match outcome {
    ///         Ok(notes) => println!("{} notes", notes.len()),
    ///         Err(e) => eprintln!("Failed to load notes: {e}"),
    ///     });
    /// # }
    /// ```
    pub fn spawn<T, F, Fut>(&self, operation: F) -> Pending<T>
    where
        F: FnOnce(NotesClient) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        pending::spawn(operation(self.clone()))
    }

    /// `GET notes`, in server order.
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let url = self.endpoint("notes")?;
        self.send(self.request(Method::GET, url), decode_json).await
    }

    /// `POST notes`. The draft is sent as-is; validate it beforehand.
    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note> {
        let url = self.endpoint("notes")?;
        self.send(self.request(Method::POST, url).json(draft), decode_json)
            .await
    }

    /// `PUT notes/{id}`.
    pub async fn update_note(&self, id: NoteId, draft: &NoteDraft) -> Result<Note> {
        let url = self.endpoint(&format!("notes/{}", id))?;
        self.send(self.request(Method::PUT, url).json(draft), decode_json)
            .await
    }

    /// `DELETE notes/{id}`. The response body is ignored.
    pub async fn delete_note(&self, id: NoteId) -> Result<()> {
        let url = self.endpoint(&format!("notes/{}", id))?;
        self.send(self.request(Method::DELETE, url), |_| Ok(()))
            .await
    }

    /// `POST upload` as a multipart form with a single `file` part.
    pub async fn upload_file(&self, bytes: Vec<u8>, file_name: &str) -> Result<UploadedFile> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ClientError::transport(&e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let url = self.endpoint("upload")?;
        self.send(self.request(Method::POST, url).multipart(form), decode_json)
            .await
    }

    /// `GET user/subscription-status`.
    pub async fn subscription_status(&self) -> Result<SubscriptionStatus> {
        let url = self.endpoint("user/subscription-status")?;
        self.send(self.request(Method::GET, url), decode_json).await
    }

    /// `GET config/{name}`: public client configuration (e.g. `firebase`).
    pub async fn public_config(&self, name: &str) -> Result<Map<String, Value>> {
        if name.is_empty() {
            return Err(ClientError::InvalidUrl("config name is empty".to_string()));
        }
        let mut url = self.endpoint("config/")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("cannot append to {}", self.base_url)))?
            .pop_if_empty()
            .push(name);
        self.send(self.request(Method::GET, url), decode_json).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Start a request, attaching the token current at issue time.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Execute one exchange and turn its outcome into a typed result.
    ///
    /// Every fault is converted here; nothing escapes as a panic.
    async fn send<T>(
        &self,
        builder: RequestBuilder,
        parse: impl FnOnce(&str) -> Result<T>,
    ) -> Result<T> {
        let request = builder.build().map_err(|e| ClientError::transport(&e))?;
        let method = request.method().to_string();
        let url = request.url().to_string();

        debug!("{} {}", method, url);
        self.events.emit(RequestEvent::Sent {
            method: method.clone(),
            url: url.clone(),
        });

        let started = Instant::now();
        let outcome: Result<T> = async {
            let response = self
                .http
                .execute(request)
                .await
                .map_err(|e| ClientError::transport(&e))?;
            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                // The status already classifies the outcome as a server fault
                Err(e) if !status.is_success() => {
                    warn!("{} {}: failed to read error body: {}", method, url, e);
                    String::new()
                }
                Err(e) => return Err(ClientError::transport(&e)),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            debug!(
                "{} {} -> {} ({} bytes, {} ms)",
                method,
                url,
                status.as_u16(),
                body.len(),
                elapsed_ms
            );
            self.events.emit(RequestEvent::Completed {
                method: method.clone(),
                url: url.clone(),
                status: status.as_u16(),
                elapsed_ms,
            });

            if !status.is_success() {
                return Err(ClientError::Server {
                    status: status.as_u16(),
                    body,
                });
            }
            parse(&body)
        }
        .await;

        if let Err(e) = &outcome {
            warn!("{} {} failed: {}", method, url, e);
            self.events.emit(RequestEvent::Failed {
                method,
                url,
                message: e.to_string(),
            });
        }
        outcome
    }
}

/// Shared connection pool with per-phase timeouts and no overall deadline.
fn http_client(connect_timeout: Duration, read_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .user_agent(concat!("notes-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ClientError::transport(&e))
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

/// Parse the base URL and make sure its path ends in `/` so relative joins
/// extend it instead of replacing its last segment.
fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            url.scheme(),
            raw
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl NotesApi for NotesClient {
    async fn list_notes(&self) -> Result<Vec<Note>> {
        NotesClient::list_notes(self).await
    }

    async fn create_note(&self, draft: &NoteDraft) -> Result<Note> {
        NotesClient::create_note(self, draft).await
    }

    async fn update_note(&self, id: NoteId, draft: &NoteDraft) -> Result<Note> {
        NotesClient::update_note(self, id, draft).await
    }

    async fn delete_note(&self, id: NoteId) -> Result<()> {
        NotesClient::delete_note(self, id).await
    }

    async fn upload_file(&self, bytes: Vec<u8>, file_name: &str) -> Result<UploadedFile> {
        NotesClient::upload_file(self, bytes, file_name).await
    }

    async fn subscription_status(&self) -> Result<SubscriptionStatus> {
        NotesClient::subscription_status(self).await
    }

    async fn public_config(&self, name: &str) -> Result<Map<String, Value>> {
        NotesClient::public_config(self, name).await
    }
}
