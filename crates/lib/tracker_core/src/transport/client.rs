//! The API client: header injection, timeout, retry, cancellation and
//! 401-triggered invalidation around an [`HttpBackend`].

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::backend::{BackendError, HttpBackend, HttpCall, HttpReply};
use super::{ApiRequest, AttemptState, RetryPolicy, TransportError};
use crate::config::ClientConfig;
use crate::session::SessionSignal;
use crate::token_store::TokenStore;

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

struct Inner {
    config: ClientConfig,
    retry: RetryPolicy,
    backend: Arc<dyn HttpBackend>,
    tokens: Arc<dyn TokenStore>,
    signals: broadcast::Sender<SessionSignal>,
}

/// Cheaply cloneable handle to the transport.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    /// Create a client.
    ///
    /// `signals` is the invalidation channel owned by the session store; the
    /// client only ever publishes on it.
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn HttpBackend>,
        tokens: Arc<dyn TokenStore>,
        signals: broadcast::Sender<SessionSignal>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                retry,
                backend,
                tokens,
                signals,
            }),
        }
    }

    /// Send `request`, retrying transient failures.
    ///
    /// Resolves to `Err(TransportError::Canceled)` as soon as `cancel` fires,
    /// whether the call is in flight or waiting to retry.
    pub async fn send(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.resolve_url(request)?;
        let mut state = AttemptState::default();

        loop {
            if cancel.is_cancelled() {
                return Err(TransportError::Canceled);
            }

            let bearer = if request.is_anonymous() {
                None
            } else {
                self.inner.tokens.load()?
            };
            let call = HttpCall {
                method: request.method().clone(),
                url: url.clone(),
                headers: default_headers(bearer.as_deref())?,
                body: request.body().cloned(),
            };
            debug!(method = %call.method, url = %url, attempt = state.attempt(), "api request");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransportError::Canceled),
                res = tokio::time::timeout(self.inner.config.timeout, self.inner.backend.execute(call)) => res,
            };

            let failure = match outcome {
                Ok(Ok(reply)) => {
                    // A response that lands after cancellation is discarded,
                    // including a 401: it must not invalidate the session.
                    if cancel.is_cancelled() {
                        return Err(TransportError::Canceled);
                    }
                    return self.handle_reply(reply, &url, bearer.as_deref());
                }
                Ok(Err(BackendError::Body { status, message })) => {
                    if cancel.is_cancelled() {
                        return Err(TransportError::Canceled);
                    }
                    return self.handle_unread_body(status, message, &url, bearer.as_deref());
                }
                Ok(Err(BackendError::Network(msg))) => TransportError::Network(msg),
                Ok(Err(BackendError::Timeout)) | Err(_) => {
                    TransportError::Timeout(self.inner.config.timeout)
                }
            };

            match self.inner.retry.next_delay(&mut state, &failure) {
                Some(delay) => {
                    debug!(url = %url, retry = state.retries, ?delay, "retrying after: {failure}");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(TransportError::Canceled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    warn!(url = %url, attempts = state.attempt(), "api request failed: {failure}");
                    return Err(failure);
                }
            }
        }
    }

    /// Send `request` and parse the JSON response body.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, TransportError> {
        self.send(request, cancel).await?.json()
    }

    fn resolve_url(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let path = request.path().trim_start_matches('/');
        let mut url = self
            .inner
            .config
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))?;
        if !request.query_pairs().is_empty() {
            url.query_pairs_mut().extend_pairs(request.query_pairs());
        }
        Ok(url)
    }

    fn handle_reply(
        &self,
        reply: HttpReply,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        debug!(status = reply.status, url = %url, "api response");
        if (200..300).contains(&reply.status) {
            return Ok(ApiResponse {
                status: reply.status,
                body: reply.body,
            });
        }
        if reply.status == 401 {
            self.invalidate(bearer);
        }
        Err(TransportError::Http {
            status: reply.status,
            body: reply.body,
        })
    }

    /// The status arrived but the body did not. The server has acted on the
    /// request, so this is final: a success becomes a decode error and any
    /// other status is reported with an empty body.
    fn handle_unread_body(
        &self,
        status: u16,
        message: String,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        warn!(status, url = %url, "failed to read response body: {message}");
        if (200..300).contains(&status) {
            return Err(TransportError::Decode(format!(
                "HTTP {status}: failed to read body: {message}"
            )));
        }
        self.handle_reply(HttpReply::new(status, ""), url, bearer)
    }

    /// Drop the rejected token and announce the invalidation.
    ///
    /// Compare-and-delete makes this idempotent: of several 401s carrying
    /// the same token only the first removes it and publishes, and a 401 for
    /// a token that has since been replaced leaves the new one alone.
    fn invalidate(&self, bearer: Option<&str>) {
        let Some(token) = bearer else {
            return;
        };
        match self.inner.tokens.clear_if(token) {
            Ok(true) => {
                info!("credential rejected, session invalidated");
                // No receivers is fine: nobody is watching the session.
                let _ = self.inner.signals.send(SessionSignal::Invalidated);
            }
            Ok(false) => debug!("rejected credential already cleared"),
            Err(e) => warn!("failed to clear rejected credential: {e}"),
        }
    }
}

fn default_headers(bearer: Option<&str>) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| TransportError::Encode(format!("invalid bearer token: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
