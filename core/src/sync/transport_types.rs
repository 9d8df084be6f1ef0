//! Transport types
//!
//! Common types shared across transport implementations.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Transport errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Network error (connection refused, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP error (non-2xx status)
    #[error("HTTP error {status}: {detail}")]
    Http { status: u16, detail: String },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Service answered 2xx but reported an error in the body
    #[error("Service error: {0}")]
    Service(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransportError {
    /// Build an HTTP error from a non-2xx response
    ///
    /// The service reports failures as `{"detail": ...}`; anything else is kept as text.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => match map.get("detail") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => body.trim().to_string(),
            },
            _ => body.trim().to_string(),
        };
        let detail = if detail.is_empty() {
            format!("HTTP {}", status)
        } else {
            detail
        };
        TransportError::Http { status, detail }
    }

    /// HTTP status, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::InvalidResponse(err.to_string())
    }
}

/// HTTP method subset used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// Outgoing request, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Unencoded path segments; transports encode them
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a single path segment (e.g. an `equipment_id`)
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Attach a JSON body
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Path form used for logging and fake routing, e.g. `/update-record/EQ-1`
    pub fn route(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Raw response; status interpretation is left to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asynchronous HTTP transport
///
/// Abstraction over the HTTP client to enable testing with `FakeTransport`.
/// Timeouts are the transport's concern; callers never cancel a request.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response, whatever its status
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}
