//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a backend response into what the caller sees
//! - Force `application/json` on JSON mounts, relay headers on passthrough mounts
//! - Synthesize `{"error": ...}` responses for gateway failures
//!
//! # Design Decisions
//! - The body is opaque: never parsed, never rewritten
//! - Hop-by-hop headers stripped automatically
//! - Gateway failures always carry an explicit status

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::BodyMode;
use crate::gateway::{GatewayError, UpstreamResponse};
use crate::security::headers::strip_hop_by_hop;

/// Content type the backend is assumed to speak.
pub const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// What the gateway returns to its caller.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    /// Extra headers relayed from the backend (passthrough mounts only).
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl BackendResponse {
    /// Relay a backend response according to the mount's body mode.
    pub fn relay(upstream: UpstreamResponse, mode: BodyMode) -> Self {
        match mode {
            BodyMode::Json => Self {
                status: upstream.status,
                content_type: APPLICATION_JSON,
                headers: HeaderMap::new(),
                body: upstream.body,
            },
            BodyMode::Passthrough => {
                let mut headers = upstream.headers;
                strip_hop_by_hop(&mut headers);
                headers.remove(header::CONTENT_LENGTH);
                let content_type = headers
                    .remove(header::CONTENT_TYPE)
                    .unwrap_or(APPLICATION_JSON);

                Self {
                    status: upstream.status,
                    content_type,
                    headers,
                    body: upstream.body,
                }
            }
        }
    }

    /// Synthesized response for a failure that produced no backend reply.
    pub fn from_error(err: &GatewayError) -> Self {
        Self {
            status: err.status(),
            content_type: APPLICATION_JSON,
            headers: HeaderMap::new(),
            body: Bytes::from(err.to_json().to_string()),
        }
    }
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();
        headers.extend(self.headers);
        headers.insert(header::CONTENT_TYPE, self.content_type);
        response
    }
}
