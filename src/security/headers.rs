//! Header manipulation and security headers.
//!
//! # Responsibilities
//! - Build outbound headers: credential injection, JSON content type, request id
//! - Strip hop-by-hop headers from relayed responses
//! - Add security response headers (optional)
//!
//! # Design Decisions
//! - Inbound client headers are never forwarded; the backend sees only what
//!   the mount policy injects
//! - Headers named in `Connection` are treated as hop-by-hop too

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::http::X_REQUEST_ID;

/// Headers that apply to a single connection and must not be relayed.
pub static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Credential the gateway injects into outbound requests.
#[derive(Clone)]
pub struct Credential {
    pub name: HeaderName,
    pub value: HeaderValue,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Which headers a mount adds to outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPolicy {
    pub forward_api_key: bool,
    pub json_request_header: bool,
}

/// Build the outbound header set for one request.
pub fn outbound_headers(
    policy: HeaderPolicy,
    credential: &Credential,
    request_id: Option<&HeaderValue>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if policy.forward_api_key {
        let mut value = credential.value.clone();
        value.set_sensitive(true);
        headers.insert(credential.name.clone(), value);
    }
    if policy.json_request_header {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    if let Some(id) = request_id {
        headers.insert(X_REQUEST_ID, id.clone());
    }

    headers
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(listed.iter()) {
        headers.remove(name);
    }
}

/// `X-Content-Type-Options: nosniff` on every response that lacks it.
pub fn nosniff_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    )
}
