//! HTTP backend seam.
//!
//! The client builds a fully-resolved [`HttpCall`] per attempt and hands it
//! to an [`HttpBackend`]. Timeouts are enforced by the client, so a backend
//! only has to report whether a response arrived.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

/// One outbound attempt, ready to dispatch.
#[derive(Debug, Clone)]
pub struct HttpCall {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

/// A received response, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure to obtain a complete response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No response was received.
    Network(String),
    Timeout,
    /// The status was received but the body could not be read.
    Body { status: u16, message: String },
}

/// Executes HTTP calls.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn execute(&self, call: HttpCall) -> Result<HttpReply, BackendError>;
}

/// Production backend on `reqwest`.
#[derive(Clone, Default)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn execute(&self, call: HttpCall) -> Result<HttpReply, BackendError> {
        let mut builder = self
            .client
            .request(call.method, call.url)
            .headers(call.headers);
        if let Some(body) = &call.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| BackendError::Body {
            status,
            message: e.to_string(),
        })?;
        Ok(HttpReply { status, body })
    }
}

fn classify(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Network(e.to_string())
    }
}
