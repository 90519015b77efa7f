//! Request layer shared by every admin API call.
//!
//! Callers build an [`ApiRequest`] and hand it to a [`Transport`]. The
//! production transport is [`HttpTransport`]; tests substitute a scripted
//! in-memory one.

mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

pub use client::HttpTransport;
pub use error::{classify_http_status, ApiError, ApiErrorKind};

/// A single JSON request against one API base.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the transport's base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Overrides the transport's default timeout
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Something that can execute an [`ApiRequest`] and return the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;
}

/// Decode a JSON body into a typed response, mapping failures to [`ApiError::decode`].
pub fn decode<T: serde::de::DeserializeOwned>(what: &str, body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body)
        .map_err(|e| ApiError::decode(format!("Failed to parse {} response: {}", what, e)))
}

/// Percent-encode a single path segment (ids come from user input).
pub fn segment(raw: &str) -> String {
    urlencoding::encode(raw.trim()).into_owned()
}
