//! Backend error types

use thiserror::Error;

/// Errors returned by a [`ChannelApi`](super::ChannelApi) implementation.
///
/// Nothing here is retried by the store; the caller of `dispatch` decides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The requested record does not exist on the backend
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    /// Transport failure (timeout, DNS, connection refused)
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// The backend is misconfigured
    #[error("config error: {0}")]
    Config(String),

    /// Failure injected by a test backend
    #[error("injected failure: {0}")]
    Injected(String),
}

impl BackendError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        BackendError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}
