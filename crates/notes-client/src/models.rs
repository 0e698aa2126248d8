//! Wire models for the notes API.
//!
//! Field names match the backend's snake_case JSON directly; the few places
//! where the wire differs (camelCase upload payload, legacy `createdAt`) are
//! declared per field.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Server-assigned note identifier. `0` means "not created yet".
pub type NoteId = i64;

/// A note as returned by the server.
///
/// Only ever produced by deserializing a response; requests use [`NoteDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub id: NoteId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    /// ISO-8601 timestamp
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Note {
    /// The attached file, if the server reported both its URL and name.
    pub fn attachment(&self) -> Option<Attachment> {
        match (self.file_url.as_deref(), self.file_name.as_deref()) {
            (Some(url), Some(name)) if !url.is_empty() && !name.is_empty() => Some(Attachment {
                file_url: url.to_string(),
                file_name: name.to_string(),
            }),
            _ => None,
        }
    }

    /// Start an edit from this note's client-owned fields.
    pub fn to_draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            attachment: self.attachment(),
        }
    }
}

/// A file reference stored on a note. URL and name always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_url: String,
    pub file_name: String,
}

/// Request body for creating or updating a note.
///
/// Carries no server-owned fields (`id`, `user_id`, `user_email`,
/// `created_at`), so a draft can never overwrite them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    #[serde(flatten)]
    pub attachment: Option<Attachment>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: impl Into<Attachment>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    /// Check the draft before submitting it.
    ///
    /// The client sends drafts as-is; callers run this first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,
}

/// Response of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_url: String,
    pub file_name: String,
}

impl From<UploadedFile> for Attachment {
    fn from(file: UploadedFile) -> Self {
        Self {
            file_url: file.file_url,
            file_name: file.file_name,
        }
    }
}

/// Response of `GET /user/subscription-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subscription_status: String,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl SubscriptionStatus {
    /// Plan name, only reported for premium users.
    pub fn plan(&self) -> Option<&str> {
        if self.is_premium {
            self.plan_name.as_deref().filter(|p| !p.is_empty())
        } else {
            None
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backends disagree on whether user ids are strings (auth provider uids)
/// or integers (database keys).
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}
