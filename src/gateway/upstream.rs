//! Outbound HTTP client.
//!
//! One GET per call, bounded by the connect and request deadlines, body
//! buffered up to a size limit. No retries.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, Uri},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::schema::{SecurityConfig, TimeoutConfig};
use crate::gateway::GatewayError;
use crate::resilience::timeouts::with_deadline;

/// A fully read backend response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Pooled HTTP/1.1 client for the diagnostics API.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
    max_response_bytes: usize,
}

impl UpstreamClient {
    pub fn new(timeouts: &TimeoutConfig, security: &SecurityConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            request_timeout: Duration::from_secs(timeouts.request_secs),
            max_response_bytes: security.max_response_bytes,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Issue a single GET to `target` with exactly `headers`.
    pub async fn get(&self, target: &Url, headers: HeaderMap) -> Result<UpstreamResponse, GatewayError> {
        let uri: Uri = target
            .as_str()
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| GatewayError::InvalidTarget(e.to_string()))?;

        let mut request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| GatewayError::InvalidTarget(e.to_string()))?;
        *request.headers_mut() = headers;

        with_deadline(self.request_timeout, async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| GatewayError::transport(&e))?;

            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), self.max_response_bytes)
                .await
                .map_err(|e| GatewayError::UpstreamBody(e.to_string()))?;

            Ok(UpstreamResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        })
        .await
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("request_timeout", &self.request_timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}
