//! Session lifecycle.
//!
//! The [`SessionStore`] owns the authenticated identity, derives it from the
//! persisted token, and owns the invalidation channel the transport client
//! publishes on when the server rejects the credential.

pub mod state;
pub mod store;

use thiserror::Error;

use crate::token_store::TokenStoreError;
use crate::transport::TransportError;

pub use state::SessionState;
pub use store::SessionStore;

/// Process-wide session notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The server answered 401 and the rejected token has been deleted.
    Invalidated,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials { status: u16, body: String },

    #[error("Token response did not include an access token")]
    MissingToken,

    #[error("Could not resolve identity: {0}")]
    Resolution(#[source] TransportError),

    #[error("Session ended while resolving identity")]
    SessionEnded,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Token storage error: {0}")]
    Storage(#[from] TokenStoreError),
}

impl AuthError {
    pub fn is_canceled(&self) -> bool {
        match self {
            Self::Resolution(e) | Self::Transport(e) => e.is_canceled(),
            _ => false,
        }
    }
}
