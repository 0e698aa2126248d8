//! Background execution of client operations.
//!
//! `spawn` runs an operation on a Tokio worker task and hands back a
//! [`Pending`] handle. The handle resolves exactly once, either by awaiting it
//! or through [`Pending::on_complete`].

use crate::error::{ClientError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Outcome of a spawned operation, delivered once.
///
/// Dropping the handle does not cancel the request; its result is discarded
/// when it arrives.
#[must_use = "a Pending does nothing unless awaited or given a callback"]
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T>>,
}

/// Run `future` on a worker task.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn spawn<T, F>(future: F) -> Pending<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let outcome = future.await;
        if tx.send(outcome).is_err() {
            tracing::debug!("Pending handle dropped before completion, discarding result");
        }
    });
    Pending { rx }
}

impl<T: Send + 'static> Pending<T> {
    /// Deliver the outcome to `callback` on a worker task.
    ///
    /// The callback runs off the caller's context; hop back to a UI thread or
    /// event loop from inside it if needed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn on_complete<F>(self, callback: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        tokio::spawn(async move {
            callback(self.await);
        });
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Sender dropped without a value: the worker panicked or was aborted
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ClientError::Cancelled)))
    }
}
