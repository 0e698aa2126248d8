//! Failure outcomes of client operations.

use thiserror::Error;

/// Every way a client operation can fail.
///
/// None of these leave the client unusable; callers may simply retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connection, DNS, timeout or I/O fault before a response arrived.
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("Error {status}: {body}")]
    Server { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A spawned operation ended without producing an outcome.
    #[error("Request was cancelled before completing")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// HTTP status for server faults.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Build a transport fault including the full source chain, since
    /// reqwest's top-level message rarely names the underlying cause.
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ClientError::Transport(message)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::InvalidUrl(e.to_string())
    }
}
