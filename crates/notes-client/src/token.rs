//! Single-slot holder for the session's bearer token.

use std::sync::{Arc, RwLock};

/// Shared bearer token slot.
///
/// Clones share the same slot. The token is read when a request is issued, so
/// a `set` racing with in-flight requests applies to some of them and not
/// others; the last write wins.
#[derive(Debug, Clone, Default)]
pub struct TokenSlot {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current token.
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}
