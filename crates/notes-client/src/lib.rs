//! notes-client: async client for the notes REST API.
//!
//! Issues bearer-authenticated requests for notes, file uploads and
//! subscription status against a fixed base URL and returns typed results.
//!
//! - [`NotesClient`] performs the HTTP exchanges (`async fn` per operation)
//! - [`NotesClient::spawn`] runs an operation on a worker task and returns a
//!   single-fire [`Pending`] handle for callback-style consumers
//! - [`NotesApi`] is the trait seam consumers program against
//! - [`EventBus`] reports every request for monitoring
//!
//! The client never retries, never refreshes tokens and never interprets
//! status codes; every failure surfaces as a [`ClientError`].

pub mod api;
pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod pending;
pub mod token;

pub use api::NotesApi;
pub use client::{CONNECT_TIMEOUT, NotesClient, READ_TIMEOUT};
pub use error::{ClientError, Result};
pub use events::{EventBus, RequestEvent, Subscription};
pub use models::{
    Attachment, Note, NoteDraft, NoteId, SubscriptionStatus, UploadedFile, ValidationError,
};
pub use pending::Pending;
pub use token::TokenSlot;
