//! The notes API as a trait, so consumers can run against a fake backend.

use crate::error::Result;
use crate::models::{Note, NoteDraft, NoteId, SubscriptionStatus, UploadedFile};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Operations offered by the notes backend.
///
/// Current implementation: `NotesClient` (HTTP)
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// All notes of the authenticated user, in server order.
    async fn list_notes(&self) -> Result<Vec<Note>>;

    /// Create a note. Returns the server's copy with `id` and `created_at`.
    async fn create_note(&self, draft: &NoteDraft) -> Result<Note>;

    /// Replace the client-owned fields of note `id`.
    async fn update_note(&self, id: NoteId, draft: &NoteDraft) -> Result<Note>;

    async fn delete_note(&self, id: NoteId) -> Result<()>;

    /// Store a file and return where it can be fetched from.
    async fn upload_file(&self, bytes: Vec<u8>, file_name: &str) -> Result<UploadedFile>;

    async fn subscription_status(&self) -> Result<SubscriptionStatus>;

    /// Public (unauthenticated) client configuration published by the backend.
    async fn public_config(&self, name: &str) -> Result<Map<String, Value>>;
}
