//! Transport client: the single choke-point for calls to the tracker API.
//!
//! Attaches the bearer token, applies the per-attempt timeout, retries
//! transient failures with linear backoff, honours caller cancellation, and
//! turns a received 401 into a session invalidation.

pub mod backend;
pub mod client;
pub mod request;
pub mod retry;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

use std::time::Duration;

use thiserror::Error;

use crate::token_store::TokenStoreError;

pub use backend::{BackendError, HttpBackend, HttpCall, HttpReply, ReqwestBackend};
pub use client::{ApiClient, ApiResponse};
pub use request::{ApiRequest, AttemptState};
pub use retry::RetryPolicy;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response was received at all.
    #[error("Network error: {0}")]
    Network(String),

    /// The attempt exceeded its time budget.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller canceled the call.
    #[error("Request canceled")]
    Canceled,

    /// A response was received with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("Request encode error: {0}")]
    Encode(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Token storage error: {0}")]
    Storage(#[from] TokenStoreError),
}

impl TransportError {
    /// Whether the retry loop may attempt the call again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// HTTP status of a received error response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_and_timeout_are_retryable() {
        assert!(TransportError::Network("reset".into()).is_retryable());
        assert!(TransportError::Timeout(Duration::from_secs(20)).is_retryable());
        assert!(!TransportError::Canceled.is_retryable());
        assert!(
            !TransportError::Http {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!TransportError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn status_is_exposed_for_http_errors_only() {
        let err = TransportError::Http {
            status: 401,
            body: "{}".into(),
        };
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(TransportError::Canceled.status(), None);
    }
}
