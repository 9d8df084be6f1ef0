//! Real HTTP transport using reqwest

use crate::sync::transport_types::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::InvalidResponse(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// HTTP transport bound to a single base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create transport for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            TransportError::Configuration(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::Configuration(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request against the base URL, percent-encoding each segment
    pub fn url_for(&self, request: &HttpRequest) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::Configuration("base URL cannot carry a path".to_string())
            })?;
            segments.pop_if_empty();
            segments.extend(request.segments.iter());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(request)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        debug!("[HTTP] {} {}", request.method, url);
        let mut builder = self.client.request(method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("[HTTP] response: status={} body_len={}", status, body.len());

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_for_joins_segments() {
        let t = transport("http://127.0.0.1:8000");
        let url = t.url_for(&HttpRequest::get("/all-data")).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/all-data");

        let t = transport("http://127.0.0.1:8000/api/");
        let url = t.url_for(&HttpRequest::get("/analytics/summary")).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/api/analytics/summary");
    }

    #[test]
    fn test_url_for_encodes_ids_and_query() {
        let t = transport("http://localhost:8000");
        let request = HttpRequest::delete("/delete-record").segment("EQ 1/B");
        let url = t.url_for(&request).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/delete-record/EQ%201%2FB");

        let request = HttpRequest::get("/search")
            .query("root_cause", "bearing wear")
            .query("limit", "10");
        let url = t.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/search?root_cause=bearing+wear&limit=10"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = HttpTransport::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));

        let err = HttpTransport::new("mailto:ops@example.com", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }
}
