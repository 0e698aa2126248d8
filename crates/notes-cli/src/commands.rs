//! Command implementations.
//!
//! Each command drives a [`NotesApi`] and returns the text to print, so the
//! same code runs against the HTTP client and against fakes in tests.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use notes_client::{Attachment, Note, NoteDraft, NoteId, NotesApi, UploadedFile};
use tracing::{info, warn};

use crate::render;

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Display name sent with the upload
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Read a file, naming it after the path's last component.
    pub async fn read(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self { name, bytes })
    }
}

/// Input of the add/edit flow.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    /// Existing note to update; `None` creates a new one
    pub id: Option<NoteId>,
    pub title: String,
    pub content: String,
    /// New attachment, uploaded before saving
    pub file: Option<LocalFile>,
}

/// Notes followed by the premium badge.
///
/// A failed status lookup falls back to the free badge; a failed note
/// lookup fails the command.
pub async fn list(api: &dyn NotesApi) -> Result<String> {
    let (notes, status) = tokio::join!(api.list_notes(), api.subscription_status());

    let status = match status {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("Failed to load subscription status: {}", e);
            None
        }
    };
    let notes = notes.context("Failed to load notes")?;

    Ok(format!(
        "{}\n\n{}",
        render::premium_label(status.as_ref()),
        render::render_list(&notes)
    ))
}

/// Look up one note. The API has no single-note endpoint, so this lists.
pub async fn find_note(api: &dyn NotesApi, id: NoteId) -> Result<Note> {
    api.list_notes()
        .await
        .context("Failed to load notes")?
        .into_iter()
        .find(|note| note.id == id)
        .ok_or_else(|| anyhow!("Note {} not found", id))
}

pub async fn show(api: &dyn NotesApi, id: NoteId) -> Result<String> {
    let note = find_note(api, id).await?;
    let mut out = render::render_note(&note);
    if let Some(url) = note.attachment().map(|a| a.file_url) {
        out.push_str(&format!("\n    {}", url));
    }
    Ok(out)
}

/// Create or update a note, uploading a new attachment first if given.
///
/// Title and content are trimmed and the title must not be empty. Without a
/// new file, an updated note keeps its current attachment.
pub async fn save_note(api: &dyn NotesApi, request: SaveRequest) -> Result<Note> {
    let mut draft = NoteDraft::new(request.title.trim(), request.content.trim());
    draft.validate()?;

    draft.attachment = match (request.file, request.id) {
        (Some(file), _) => {
            let uploaded = upload(api, file).await?;
            Some(Attachment::from(uploaded))
        }
        (None, Some(id)) => find_note(api, id).await?.attachment(),
        (None, None) => None,
    };

    let saved = match request.id {
        Some(id) => api
            .update_note(id, &draft)
            .await
            .context("Failed to update note")?,
        None => api
            .create_note(&draft)
            .await
            .context("Failed to create note")?,
    };
    info!("Saved note {}", saved.id);
    Ok(saved)
}

/// Save, then print the refreshed list.
pub async fn save(api: &dyn NotesApi, request: SaveRequest) -> Result<String> {
    let saved = save_note(api, request).await?;
    Ok(format!("Saved note #{}\n\n{}", saved.id, list(api).await?))
}

/// Delete, then print the refreshed list.
pub async fn delete(api: &dyn NotesApi, id: NoteId) -> Result<String> {
    api.delete_note(id)
        .await
        .context("Failed to delete note")?;
    info!("Deleted note {}", id);
    Ok(format!("Note deleted\n\n{}", list(api).await?))
}

async fn upload(api: &dyn NotesApi, file: LocalFile) -> Result<UploadedFile> {
    let size = file.bytes.len();
    let uploaded = api
        .upload_file(file.bytes, &file.name)
        .await
        .context("Failed to upload file")?;
    info!("Uploaded {} ({} bytes)", uploaded.file_name, size);
    Ok(uploaded)
}

pub async fn upload_only(api: &dyn NotesApi, file: LocalFile) -> Result<String> {
    let uploaded = upload(api, file).await?;
    Ok(format!(
        "fileUrl: {}\nfileName: {}",
        uploaded.file_url, uploaded.file_name
    ))
}

pub async fn status(api: &dyn NotesApi) -> Result<String> {
    let status = api
        .subscription_status()
        .await
        .context("Failed to load subscription status")?;
    Ok(render::render_status(&status))
}

pub async fn public_config(api: &dyn NotesApi, name: &str) -> Result<String> {
    let config = api
        .public_config(name)
        .await
        .with_context(|| format!("Failed to load {} config", name))?;
    Ok(serde_json::to_string_pretty(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_file_takes_last_component() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let file = LocalFile::read(&path).await.unwrap();
        assert_eq!(file.name, "photo.jpg");
        assert_eq!(file.bytes, b"jpeg");
    }

    #[tokio::test]
    async fn test_local_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = LocalFile::read(&dir.path().join("missing.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
