//! Plain-text rendering of notes and subscription status.

use chrono::NaiveDateTime;
use notes_client::{Note, SubscriptionStatus};

pub const EMPTY_LIST: &str = "No notes yet. Create one with `notes save --title <TITLE>`.";

/// `2024-03-05T10:00:00Z` -> `Mar 05, 2024`. Unparseable input is shown as-is.
pub fn format_date(created_at: &str) -> String {
    let head = created_at.get(..19).unwrap_or(created_at);
    match NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S") {
        Ok(date) => date.format("%b %d, %Y").to_string(),
        Err(_) => created_at.to_string(),
    }
}

/// Badge shown above the note list. A missing status counts as free.
pub fn premium_label(status: Option<&SubscriptionStatus>) -> String {
    match status {
        Some(status) if status.is_premium => match status.plan() {
            Some(plan) => format!("✓ Premium - {}", plan),
            None => "✓ Premium".to_string(),
        },
        _ => "Status: Free".to_string(),
    }
}

pub fn render_note(note: &Note) -> String {
    let mut out = format!("#{}  {}", note.id, note.title);
    if let Some(created_at) = note.created_at.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!("  ({})", format_date(created_at)));
    }
    for line in note.content.lines() {
        out.push_str("\n    ");
        out.push_str(line);
    }
    if let Some(file_name) = note.file_name.as_deref().filter(|f| !f.is_empty()) {
        out.push_str(&format!("\n    📎 {}", file_name));
    }
    out
}

pub fn render_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return EMPTY_LIST.to_string();
    }
    notes
        .iter()
        .map(render_note)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_status(status: &SubscriptionStatus) -> String {
    let mut out = premium_label(Some(status));
    if !status.subscription_status.is_empty() {
        out.push_str(&format!("\nSubscription: {}", status.subscription_status));
    }
    if let Some(expires_at) = status.expires_at.as_deref() {
        out.push_str(&format!("\nExpires: {}", format_date(expires_at)));
    }
    out
}
