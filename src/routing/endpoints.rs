//! Logical endpoint lookup.
//!
//! # Responsibilities
//! - Normalize the endpoint name the dashboard sends (`/api/dns` → `dns`)
//! - Look the name up in the allow-list
//! - Enforce each endpoint's path parameter rule
//! - Return the resolved backend path or an explicit rejection
//!
//! # Design Decisions
//! - Immutable after construction (shared through the runtime snapshot)
//! - O(1) name lookup via HashMap
//! - Unknown names never reach the network in strict mode
//! - Lenient mode keeps the training scenario's open concatenation

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::config::{EndpointConfig, EndpointsConfig, PathParamRule};
use crate::gateway::GatewayError;

/// Prefix the dashboard may leave on endpoint names.
pub const API_PREFIX: &str = "/api/";

/// Strip one leading `/api/` from an endpoint name.
pub fn normalize_endpoint(endpoint: &str) -> &str {
    endpoint.strip_prefix(API_PREFIX).unwrap_or(endpoint)
}

/// Where a request will land below `<base>/api/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// A listed endpoint. `path_param` is decoded and still needs encoding.
    Listed {
        endpoint: String,
        backend_path: String,
        path_param: Option<String>,
    },
    /// Unchecked path, already encoded, appended verbatim.
    Raw { endpoint: String, path: String },
}

impl ResolvedPath {
    /// Logical endpoint name, for logs and metrics.
    pub fn endpoint(&self) -> &str {
        match self {
            ResolvedPath::Listed { endpoint, .. } | ResolvedPath::Raw { endpoint, .. } => endpoint,
        }
    }

    /// Whether the endpoint came from the allow-list.
    pub fn is_listed(&self) -> bool {
        matches!(self, ResolvedPath::Listed { .. })
    }
}

/// Compiled endpoint allow-list.
#[derive(Debug, Clone)]
pub struct EndpointTable {
    strict: bool,
    entries: HashMap<String, EndpointConfig>,
}

impl EndpointTable {
    /// Build the table from configuration.
    pub fn from_config(config: &EndpointsConfig) -> Self {
        let entries = config
            .allow
            .iter()
            .map(|e| (e.name.clone(), e.clone()))
            .collect();

        Self {
            strict: config.strict,
            entries,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a query-style request (`endpoint` + decoded `pathParam`).
    pub fn resolve(
        &self,
        endpoint: &str,
        path_param: Option<&str>,
    ) -> Result<ResolvedPath, GatewayError> {
        let name = normalize_endpoint(endpoint);
        let path_param = path_param.filter(|p| !p.is_empty());

        match self.entries.get(name) {
            Some(entry) => listed(entry, path_param),
            None if self.strict => Err(GatewayError::UnknownEndpoint(name.to_string())),
            None => {
                let mut path = name.to_string();
                if let Some(param) = path_param {
                    path.push('/');
                    path.extend(form_urlencoded::byte_serialize(param.as_bytes()));
                }
                Ok(ResolvedPath::Raw {
                    endpoint: name.to_string(),
                    path,
                })
            }
        }
    }

    /// Resolve the raw (still percent-encoded) path found below a prefix mount.
    pub fn resolve_prefixed(&self, rest: &str) -> Result<ResolvedPath, GatewayError> {
        let rest = rest.trim_start_matches('/');
        let mut segments = rest.splitn(2, '/');
        let name = segments.next().unwrap_or_default();
        let tail = segments.next().filter(|t| !t.is_empty());

        if !self.strict && !self.entries.contains_key(name) {
            return Ok(ResolvedPath::Raw {
                endpoint: name.to_string(),
                path: rest.to_string(),
            });
        }

        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| GatewayError::UnknownEndpoint(name.to_string()))?;

        let param = match tail {
            Some(tail) if tail.trim_end_matches('/').contains('/') => {
                return Err(GatewayError::InvalidPath(format!(
                    "'{}' accepts a single path segment",
                    name
                )));
            }
            Some(tail) => {
                let decoded = percent_decode_str(tail.trim_end_matches('/'))
                    .decode_utf8()
                    .map_err(|_| GatewayError::InvalidPath("path is not valid UTF-8".into()))?;
                Some(decoded.into_owned())
            }
            None => None,
        };

        listed(entry, param.as_deref().filter(|p| !p.is_empty()))
    }
}

fn listed(entry: &EndpointConfig, path_param: Option<&str>) -> Result<ResolvedPath, GatewayError> {
    match (entry.path_param, path_param) {
        (PathParamRule::None, Some(_)) => {
            return Err(GatewayError::UnexpectedPathParam(entry.name.clone()));
        }
        (PathParamRule::Required, None) => {
            return Err(GatewayError::MissingPathParam(entry.name.clone()));
        }
        _ => {}
    }

    // URL path segments collapse `.` and `..`, which would drop the parameter
    if let Some(param @ ("." | "..")) = path_param {
        return Err(GatewayError::InvalidPath(format!(
            "'{}' is not a valid path parameter",
            param
        )));
    }

    Ok(ResolvedPath::Listed {
        endpoint: entry.name.clone(),
        backend_path: entry.backend_path().to_string(),
        path_param: path_param.map(str::to_string),
    })
}
