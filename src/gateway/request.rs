//! Inbound query translation.
//!
//! The dashboard addresses the gateway as
//! `?endpoint=<name>&pathParam=<segment>&<other>=<value>`; this module turns
//! that query into a [`ProxyRequest`].

use std::collections::BTreeMap;

use url::form_urlencoded;

/// Query key naming the logical endpoint.
pub const ENDPOINT_PARAM: &str = "endpoint";
/// Query key carrying a single path segment.
pub const PATH_PARAM: &str = "pathParam";
/// Endpoint used when the request names none.
pub const DEFAULT_ENDPOINT: &str = "healthcheck";

/// A parsed gateway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Logical endpoint as sent (may still carry a leading `/api/`).
    pub endpoint: String,
    /// Decoded path segment, `None` when absent or empty.
    pub path_param: Option<String>,
    /// Everything else, forwarded to the backend.
    pub query: BTreeMap<String, String>,
}

impl ProxyRequest {
    /// Build from decoded key/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut query: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let endpoint = query
            .remove(ENDPOINT_PARAM)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let path_param = query.remove(PATH_PARAM).filter(|p| !p.is_empty());

        Self {
            endpoint,
            path_param,
            query,
        }
    }

    /// Build from a raw `application/x-www-form-urlencoded` query string.
    pub fn from_query_string(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or_default();
        Self::from_pairs(form_urlencoded::parse(raw.as_bytes()).into_owned())
    }
}

impl Default for ProxyRequest {
    fn default() -> Self {
        Self::from_pairs(std::iter::empty::<(String, String)>())
    }
}
