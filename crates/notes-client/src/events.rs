//! Request events for monitoring client traffic.
//!
//! `RequestEvent`s are emitted for every HTTP exchange. `EventBus` fans them
//! out to subscribers; hold the returned `Subscription` to keep receiving,
//! drop it to unsubscribe.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// One step of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestEvent {
    /// Request handed to the transport.
    Sent { method: String, url: String },
    /// Response received (any status).
    Completed {
        method: String,
        url: String,
        status: u16,
        #[serde(rename = "elapsedMs")]
        elapsed_ms: u64,
    },
    /// Operation failed (transport, server or decode fault).
    Failed {
        method: String,
        url: String,
        message: String,
    },
}

/// Keeps a callback registered. Dropping it removes the callback before
/// `drop` returns, so no later `emit` reaches it.
#[must_use = "the callback is removed as soon as the Subscription is dropped"]
pub struct Subscription {
    bus: Weak<EventBus>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            // Release the lock before the callback (and whatever it owns) is freed
            let removed = bus.subscribers_mut().remove(&self.id);
            drop(removed);
        }
    }
}

type Callback = Arc<dyn Fn(&RequestEvent) + Send + Sync>;

/// Fans [`RequestEvent`]s out to subscribers, in subscription order.
///
/// Callbacks run on whichever task issued the request and never under the
/// registry lock, so a callback may subscribe or drop a `Subscription`.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<BTreeMap<u64, Callback>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(&RequestEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers_mut().insert(id, Arc::new(callback));
        Subscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    pub fn emit(&self, event: RequestEvent) {
        let targets: Vec<Callback> = self.subscribers().values().cloned().collect();
        for callback in targets {
            callback(&event);
        }
    }

    // A panicking callback never holds the lock, so poisoning only means a
    // panic inside insert/remove; the map is still consistent.
    fn subscribers(&self) -> RwLockReadGuard<'_, BTreeMap<u64, Callback>> {
        self.subscribers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn subscribers_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<u64, Callback>> {
        self.subscribers.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
