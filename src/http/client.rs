//! reqwest-backed transport with bearer-token injection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::{ApiError, ApiRequest, Transport};
use crate::auth::CredentialProvider;

/// JSON transport bound to one API base URL.
///
/// Attaches `Authorization: Bearer <token>` whenever the credential provider
/// holds a token. A 401 from any endpoint clears the stored token so that the
/// next command starts from the login boundary.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url,
            client,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(method = %request.method, %url, "admin api request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header("Content-Type", "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = self.credentials.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%url, "admin api rejected the session; clearing stored token");
            self.credentials.clear();
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), text));
        }

        // A body cut short is a transport failure, not an empty success.
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(format!("Timed out reading response from {}: {}", url, e))
            } else {
                ApiError::network(format!("Failed to read response from {}: {}", url, e))
            }
        })?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::decode(format!("Failed to parse response from {}: {}, body: {}", url, e, text))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentials;
    use crate::http::ApiErrorKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request head.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{}/api/", addr), handle)
    }

    #[tokio::test]
    async fn unauthorized_clears_stored_token() {
        let (base, server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 12\r\nConnection: close\r\n\r\nbad session.",
        )
        .await;
        let credentials = Arc::new(MemoryCredentials::with_token("stale"));
        let transport =
            HttpTransport::new(base, Duration::from_secs(5), credentials.clone()).unwrap();

        let err = transport
            .send(ApiRequest::get("/admin/enrich/status"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert_eq!(credentials.token(), None);
        let head = server.await.unwrap();
        assert!(head.starts_with("GET /api/admin/enrich/status"));
        assert!(head.to_ascii_lowercase().contains("authorization: bearer stale"));
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let (base, _server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let transport = HttpTransport::new(
            base,
            Duration::from_secs(5),
            Arc::new(MemoryCredentials::new()),
        )
        .unwrap();

        let body = transport.send(ApiRequest::post("/admin/enrich/start")).await.unwrap();
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn truncated_success_body_is_a_transient_error() {
        let (base, _server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 500\r\nConnection: close\r\n\r\n{\"status\":",
        )
        .await;
        let transport = HttpTransport::new(
            base,
            Duration::from_secs(5),
            Arc::new(MemoryCredentials::new()),
        )
        .unwrap();

        let err = transport
            .send(ApiRequest::get("/admin/bulk-translation-status/t1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Network);
        assert!(err.is_transient());
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let transport = HttpTransport::new(
            "http://localhost:8000/api//",
            Duration::from_secs(1),
            Arc::new(MemoryCredentials::new()),
        )
        .unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000/api");
    }
}
