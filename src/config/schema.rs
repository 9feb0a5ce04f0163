//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Placeholder API key shipped for local development.
///
/// Startup logs a warning whenever this key is still in effect.
pub const PLACEHOLDER_API_KEY: &str = "insecure_api_key_12345";

/// Root configuration for the diagnostic gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Diagnostics API location and credential.
    pub backend: BackendConfig,

    /// Logical endpoint allow-list.
    pub endpoints: EndpointsConfig,

    /// Inbound surfaces served by the gateway.
    pub mounts: Vec<MountConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request/response limits and response headers.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backend: BackendConfig::default(),
            endpoints: EndpointsConfig::default(),
            mounts: default_mounts(),
            timeouts: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Diagnostics API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the diagnostics API. Overridden by `API_URL`.
    pub api_url: String,

    /// Shared secret sent to the API. Overridden by `API_KEY`.
    pub api_key: String,

    /// Header carrying the API key.
    pub credential_header: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            // WARNING: This is a placeholder! Set API_KEY in any real deployment.
            api_key: PLACEHOLDER_API_KEY.to_string(),
            credential_header: "X-API-Key".to_string(),
        }
    }
}

/// Logical endpoint allow-list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Reject endpoint names that are not listed.
    ///
    /// Setting this to false reproduces the open concatenation of the
    /// training scenario.
    pub strict: bool,

    /// Known endpoints.
    pub allow: Vec<EndpointConfig>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            strict: true,
            allow: default_endpoints(),
        }
    }
}

/// A single logical endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Name the dashboard uses (e.g. "dns").
    pub name: String,

    /// Backend path below `/api/`. Defaults to `name`.
    #[serde(default)]
    pub path: Option<String>,

    /// Whether a trailing path segment is accepted.
    #[serde(default)]
    pub path_param: PathParamRule,
}

impl EndpointConfig {
    fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            path_param: PathParamRule::None,
        }
    }

    fn with_param(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            path_param: PathParamRule::Required,
        }
    }

    /// Backend path below `/api/`.
    pub fn backend_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}

/// Path parameter acceptance for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathParamRule {
    #[default]
    None,
    Optional,
    Required,
}

fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig::plain("healthcheck"),
        EndpointConfig::plain("sqlversion"),
        EndpointConfig::plain("sqlwhoami"),
        EndpointConfig::plain("sqlsrcip"),
        EndpointConfig::with_param("dns"),
        EndpointConfig::with_param("reversedns"),
        EndpointConfig::plain("curl"),
        EndpointConfig::plain("printenv"),
        EndpointConfig::plain("pi"),
        EndpointConfig::plain("ip"),
    ]
}

/// How a mount reads the logical endpoint from the inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MountMode {
    /// `?endpoint=...&pathParam=...` on a fixed path.
    Query,
    /// Everything below the mount path is the backend path.
    Prefix,
}

/// How the backend response is relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    /// Content type forced to `application/json`.
    Json,
    /// Backend headers relayed (minus hop-by-hop).
    Passthrough,
}

/// One inbound surface of the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MountConfig {
    /// Path (query mode) or path prefix (prefix mode), e.g. "/api".
    pub path: String,

    pub mode: MountMode,

    #[serde(default = "default_body_mode")]
    pub body: BodyMode,

    /// Inject the credential header on outbound calls.
    #[serde(default = "default_true")]
    pub forward_api_key: bool,

    /// Send `Content-Type: application/json` on outbound calls.
    #[serde(default)]
    pub json_request_header: bool,
}

fn default_body_mode() -> BodyMode {
    BodyMode::Json
}

fn default_true() -> bool {
    true
}

fn default_mounts() -> Vec<MountConfig> {
    let query = |path: &str| MountConfig {
        path: path.to_string(),
        mode: MountMode::Query,
        body: BodyMode::Json,
        forward_api_key: true,
        json_request_header: true,
    };

    vec![
        query("/api-proxy.php"),
        query("/api-proxy"),
        MountConfig {
            path: "/api".to_string(),
            mode: MountMode::Prefix,
            body: BodyMode::Passthrough,
            forward_api_key: true,
            json_request_header: false,
        },
    ]
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for the upstream request and body in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `X-Content-Type-Options: nosniff` to responses.
    pub enable_headers: bool,
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
    /// Maximum buffered upstream body in bytes.
    pub max_response_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
            max_response_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
