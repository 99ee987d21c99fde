//! Request descriptor and per-call attempt state.

use reqwest::Method;
use serde::Serialize;

use super::TransportError;

/// Immutable description of one API call.
///
/// `path` is relative to the configured base URL (e.g. `mini-projects/4/`).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    anonymous: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        let value =
            serde_json::to_value(body).map_err(|e| TransportError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Send without the stored bearer token.
    ///
    /// A 401 to an anonymous request says nothing about the stored session,
    /// so it never invalidates it.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

/// Mutable retry bookkeeping for a single call.
///
/// Lives only inside one `ApiClient::send` invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    /// Retries performed so far (0 on the first attempt).
    pub retries: u32,
}

impl AttemptState {
    /// 1-based number of the attempt currently being made.
    pub fn attempt(&self) -> u32 {
        self.retries + 1
    }
}
