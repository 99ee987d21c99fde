//! # tracker_core
//!
//! Client core for the mini-project tracker API: a transport client with
//! bounded retry and session invalidation, a token-backed session store, and
//! typed wrappers over the project and report endpoints.

pub mod api;
pub mod config;
pub mod models;
pub mod session;
pub mod token_store;
pub mod transport;

pub use config::ClientConfig;
pub use session::{AuthError, SessionSignal, SessionState, SessionStore};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ApiClient, ApiRequest, TransportError};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
