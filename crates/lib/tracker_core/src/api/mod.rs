//! Typed calls over the tracker endpoints.
//!
//! Every call takes the shared [`ApiClient`](crate::transport::ApiClient) and
//! a cancellation token; callers cancel a superseded call before issuing its
//! replacement.

pub mod auth;
pub mod projects;
pub mod reports;

use thiserror::Error;

use crate::transport::TransportError;

/// Domain API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A client-side hint rejected the input before any request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller's role may not perform this action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Project not found: {0}")]
    NotFound(i64),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_canceled())
    }
}
