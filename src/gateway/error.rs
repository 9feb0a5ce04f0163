//! Gateway error taxonomy and its HTTP mapping.

use std::error::Error as StdError;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Errors raised while translating or forwarding a request.
///
/// Backend 4xx/5xx responses are not errors; they are relayed as-is.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Endpoint '{0}' requires a path parameter")]
    MissingPathParam(String),

    #[error("Endpoint '{0}' does not accept a path parameter")]
    UnexpectedPathParam(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Upstream response could not be read: {0}")]
    UpstreamBody(String),

    #[error("Upstream request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Not Found")]
    NotFound,
}

impl GatewayError {
    /// Wrap a transport error, keeping its whole source chain.
    pub fn transport(err: &(dyn StdError + 'static)) -> Self {
        GatewayError::Transport(error_chain(err))
    }

    /// Fixed status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UnknownEndpoint(_) | GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MissingPathParam(_)
            | GatewayError::UnexpectedPathParam(_)
            | GatewayError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            GatewayError::InvalidTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Transport(_) | GatewayError::UpstreamBody(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::UnknownEndpoint(_) => "unknown_endpoint",
            GatewayError::MissingPathParam(_) => "missing_path_param",
            GatewayError::UnexpectedPathParam(_) => "unexpected_path_param",
            GatewayError::InvalidPath(_) => "invalid_path",
            GatewayError::InvalidTarget(_) => "invalid_target",
            GatewayError::Transport(_) => "transport",
            GatewayError::UpstreamBody(_) => "upstream_body",
            GatewayError::Timeout(_) => "timeout",
            GatewayError::NotFound => "not_found",
        }
    }

    /// `{"error": "<message>"}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_json())).into_response()
    }
}

/// Join an error with its sources: `outer: inner: root`.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::UnknownEndpoint("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(GatewayError::MissingPathParam("dns".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::Transport("refused".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            GatewayError::Timeout(Duration::from_secs(3)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(GatewayError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_json_body() {
        assert_eq!(GatewayError::NotFound.to_json(), serde_json::json!({"error": "Not Found"}));
        assert_eq!(
            GatewayError::Timeout(Duration::from_secs(3)).to_json()["error"],
            "Upstream request timed out after 3s"
        );
    }

    #[test]
    fn test_error_chain_includes_sources() {
        #[derive(Debug, thiserror::Error)]
        #[error("client error (Connect)")]
        struct Outer(#[source] std::io::Error);

        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(error_chain(&err), "client error (Connect): connection refused");
        assert_eq!(
            GatewayError::transport(&err).to_string(),
            "Upstream request failed: client error (Connect): connection refused"
        );
    }
}
