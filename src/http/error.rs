//! Admin API error types with retry classification.
//!
//! Distinguishes between transient errors (a poll loop may retry) and
//! permanent errors (the task is gone, the session expired, or the server
//! rejected the request).

/// Error from an admin API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The kind of error
    pub kind: ApiErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message (response body or transport error text)
    pub message: String,
}

impl ApiError {
    /// Build an error from a non-2xx HTTP response.
    pub fn from_status(status_code: u16, message: String) -> Self {
        Self {
            kind: classify_http_status(status_code),
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a network error (connection refused, reset, DNS).
    pub fn network(message: String) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            status_code: None,
            message,
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: String) -> Self {
        Self {
            kind: ApiErrorKind::Timeout,
            status_code: None,
            message,
        }
    }

    /// Create a decode error (2xx response whose body is not what we expected).
    pub fn decode(message: String) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            status_code: None,
            message,
        }
    }

    /// Check if this error is transient.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::timeout(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            ApiError::network(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            ApiError::decode(format!("Failed to read response: {}", e))
        } else {
            ApiError::network(format!("Request failed: {}", e))
        }
    }
}

/// Classification of admin API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 401 - the stored token is missing, expired or revoked
    Unauthorized,
    /// 404 - the resource (or task) does not exist
    NotFound,
    /// 410 - the resource existed but has been discarded
    Gone,
    /// Other 4xx, or a status outside 4xx/5xx - permanent
    ClientError,
    /// 429 - transient
    RateLimited,
    /// 5xx - transient
    ServerError,
    /// Connection failed - transient
    Network,
    /// Request timed out - transient
    Timeout,
    /// Response body could not be decoded - permanent
    Decode,
}

impl ApiErrorKind {
    /// Check if this error kind is transient (worth retrying the same request).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiErrorKind::RateLimited
                | ApiErrorKind::ServerError
                | ApiErrorKind::Network
                | ApiErrorKind::Timeout
        )
    }
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ApiErrorKind::NotFound => write!(f, "Not found"),
            ApiErrorKind::Gone => write!(f, "Gone"),
            ApiErrorKind::ClientError => write!(f, "Client error"),
            ApiErrorKind::RateLimited => write!(f, "Rate limited"),
            ApiErrorKind::ServerError => write!(f, "Server error"),
            ApiErrorKind::Network => write!(f, "Network error"),
            ApiErrorKind::Timeout => write!(f, "Timeout"),
            ApiErrorKind::Decode => write!(f, "Decode error"),
        }
    }
}

/// Parse HTTP status code into error kind.
pub fn classify_http_status(status: u16) -> ApiErrorKind {
    match status {
        401 => ApiErrorKind::Unauthorized,
        404 => ApiErrorKind::NotFound,
        410 => ApiErrorKind::Gone,
        429 => ApiErrorKind::RateLimited,
        500..=599 => ApiErrorKind::ServerError,
        _ => ApiErrorKind::ClientError,
    }
}
