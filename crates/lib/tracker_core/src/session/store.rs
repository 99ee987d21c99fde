//! Session store: the single owner of "who is logged in".

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AuthError, SessionSignal, SessionState};
use crate::api::auth;
use crate::config::ClientConfig;
use crate::models::{Identity, Role};
use crate::token_store::{FileTokenStore, TokenStore};
use crate::transport::{ApiClient, HttpBackend, ReqwestBackend, TransportError};

const SIGNAL_CAPACITY: usize = 16;

/// Holds the session state and drives its transitions.
///
/// Creating a store spawns a listener on the invalidation channel, so it must
/// be constructed inside a Tokio runtime.
pub struct SessionStore {
    client: ApiClient,
    tokens: Arc<dyn TokenStore>,
    state: Arc<watch::Sender<SessionState>>,
    signals: broadcast::Sender<SessionSignal>,
    // Serialises restore and login.
    transitions: Mutex<()>,
    listener: JoinHandle<()>,
}

impl SessionStore {
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn HttpBackend>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        let client = ApiClient::new(config, backend, tokens.clone(), signals.clone());
        let (state, _) = watch::channel(SessionState::Anonymous);
        let state = Arc::new(state);
        let listener = spawn_invalidation_listener(
            signals.subscribe(),
            state.clone(),
            tokens.clone(),
        );

        Self {
            client,
            tokens,
            state,
            signals,
            transitions: Mutex::new(()),
            listener,
        }
    }

    /// Store on `reqwest` with the token file at `config.token_path`.
    pub fn with_reqwest(config: ClientConfig) -> Self {
        let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));
        Self::new(config, Arc::new(ReqwestBackend::new()), tokens)
    }

    /// The client domain calls go through.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn role(&self) -> Option<Role> {
        self.state.borrow().identity().map(Identity::role)
    }

    pub fn is_trainer(&self) -> bool {
        self.role() == Some(Role::Trainer)
    }

    /// Observe every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Observe raw invalidation signals.
    pub fn signals(&self) -> broadcast::Receiver<SessionSignal> {
        self.signals.subscribe()
    }

    /// Derive the session from the persisted token.
    ///
    /// Without a token this settles on `Anonymous` without touching the
    /// network. A rejected token (4xx or an unreadable identity) is deleted;
    /// network failures, timeouts and 5xx leave it in place for a later
    /// attempt. An already authenticated session is returned as is.
    pub async fn restore(&self, cancel: &CancellationToken) -> SessionState {
        let _guard = self.transitions.lock().await;

        let current = self.state();
        if current.is_authenticated() {
            return current;
        }

        let token = match self.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.set(SessionState::Anonymous);
                return SessionState::Anonymous;
            }
            Err(e) => {
                warn!("Could not read persisted token: {e}");
                self.set(SessionState::Anonymous);
                return SessionState::Anonymous;
            }
        };

        match self.resolve(&token, cancel).await {
            Ok(identity) => {
                info!(username = %identity.username, "session restored");
                SessionState::Authenticated(identity)
            }
            Err(e) => {
                if let AuthError::Resolution(cause) = &e
                    && rejects_credential(cause)
                {
                    self.discard(&token);
                }
                debug!("session not restored: {e}");
                self.set(SessionState::Anonymous);
                SessionState::Anonymous
            }
        }
    }

    /// Exchange credentials for a token, persist it, then resolve identity.
    ///
    /// Nothing is persisted when the exchange fails. When the exchange
    /// succeeds but identity cannot be resolved, the new token is removed
    /// again and the session ends up `Anonymous`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, AuthError> {
        let _guard = self.transitions.lock().await;

        let response = match auth::obtain_token(&self.client, username, password, cancel).await {
            Ok(response) => response,
            Err(TransportError::Http { status, body }) if status == 400 || status == 401 => {
                return Err(AuthError::InvalidCredentials { status, body });
            }
            Err(e) => return Err(e.into()),
        };
        let token = response
            .access
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.tokens.save(&token)?;

        match self.resolve(&token, cancel).await {
            Ok(identity) => {
                info!(username = %identity.username, role = %identity.role(), "logged in");
                Ok(identity)
            }
            Err(e) => {
                self.discard(&token);
                self.set(SessionState::Anonymous);
                Err(e)
            }
        }
    }

    /// Remove the token and forget the identity. Idempotent.
    pub fn logout(&self) {
        match self.tokens.clear() {
            Ok(true) => info!("logged out"),
            Ok(false) => debug!("logout without a persisted token"),
            Err(e) => warn!("Could not remove persisted token: {e}"),
        }
        self.set(SessionState::Anonymous);
    }

    async fn resolve(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, AuthError> {
        self.set(SessionState::Resolving);
        let identity = auth::me(&self.client, cancel)
            .await
            .map_err(AuthError::Resolution)?;

        // A logout or invalidation while the call was in flight wins.
        if self.tokens.load()?.as_deref() != Some(token) {
            return Err(AuthError::SessionEnded);
        }
        self.set(SessionState::Authenticated(identity.clone()));
        Ok(identity)
    }

    fn discard(&self, token: &str) {
        if let Err(e) = self.tokens.clear_if(token) {
            warn!("Could not remove rejected token: {e}");
        }
    }

    fn set(&self, next: SessionState) {
        set_state(&self.state, next);
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn set_state(state: &watch::Sender<SessionState>, next: SessionState) {
    state.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        debug!(from = ?current, to = ?next, "session transition");
        *current = next;
        true
    });
}

/// Whether a failed identity lookup means the token itself is bad.
fn rejects_credential(err: &TransportError) -> bool {
    match err {
        TransportError::Http { status, .. } => (400..500).contains(status),
        TransportError::Decode(_) => true,
        _ => false,
    }
}

fn spawn_invalidation_listener(
    mut signals: broadcast::Receiver<SessionSignal>,
    state: Arc<watch::Sender<SessionState>>,
    tokens: Arc<dyn TokenStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match signals.recv().await {
                Ok(SessionSignal::Invalidated) | Err(RecvError::Lagged(_)) => {
                    // The rejected token is already gone; one present now was
                    // issued after it.
                    match tokens.load() {
                        Ok(Some(_)) => {
                            debug!("ignoring invalidation for a replaced token");
                        }
                        _ => {
                            if !state.borrow().is_anonymous() {
                                info!("session invalidated by the server");
                            }
                            set_state(&state, SessionState::Anonymous);
                        }
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
