//! Diagnostic gateway core.
//!
//! # Data Flow
//! ```text
//! Query mount:   ?endpoint=dns&pathParam=example.com&x=1
//!     → request.rs (ProxyRequest: endpoint, pathParam, remaining query)
//! Prefix mount:  /api/dns/example.com?x=1
//!     → raw path below the mount + raw query string
//!
//!     → routing::EndpointTable (allow-list, path parameter rule)
//!     → target.rs (<api_url>/api/<path>[/<param>][?query])
//!     → security::headers (credential, content type, request id)
//!     → upstream.rs (one GET, deadline, buffered body)
//!     → http::BackendResponse (status + body verbatim, content type per mount)
//! ```
//!
//! # Design Decisions
//! - One component serves every mount; mounts only differ in policy
//! - Configuration is compiled into an immutable [`Runtime`] snapshot and
//!   swapped atomically on reload
//! - Exactly one outbound call per inbound call, never retried
//! - Failures become `{"error": ...}` with a fixed status, never a panic

pub mod error;
pub mod request;
pub mod target;
pub mod upstream;

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::validation::{validate_config, ValidationError};
use crate::config::{ConfigError, GatewayConfig, MountConfig};
use crate::http::BackendResponse;
use crate::observability::metrics;
use crate::resilience::timeouts::INBOUND_SLACK;
use crate::routing::{EndpointTable, ResolvedPath};
use crate::security::headers::{outbound_headers, Credential, HeaderPolicy};

pub use error::GatewayError;
pub use request::ProxyRequest;
pub use target::{build_target, TargetQuery};
pub use upstream::{UpstreamClient, UpstreamResponse};

/// Everything derived from one configuration revision.
#[derive(Debug)]
pub struct Runtime {
    base_url: Url,
    credential: Credential,
    endpoints: EndpointTable,
    upstream: UpstreamClient,
}

impl Runtime {
    /// Validate and compile a configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let invalid = |field: &str, message: String| {
            ConfigError::Validation(vec![ValidationError {
                field: field.to_string(),
                message,
            }])
        };

        let base_url = Url::parse(&config.backend.api_url)
            .map_err(|e| invalid("backend.api_url", e.to_string()))?;
        let name = HeaderName::from_bytes(config.backend.credential_header.as_bytes())
            .map_err(|e| invalid("backend.credential_header", e.to_string()))?;
        let value = HeaderValue::from_str(&config.backend.api_key)
            .map_err(|e| invalid("backend.api_key", e.to_string()))?;

        Ok(Self {
            base_url,
            credential: Credential { name, value },
            endpoints: EndpointTable::from_config(&config.endpoints),
            upstream: UpstreamClient::new(&config.timeouts, &config.security),
        })
    }

    /// Deadline for a whole inbound request under this revision.
    pub fn inbound_deadline(&self) -> Duration {
        self.upstream.request_timeout() + INBOUND_SLACK
    }

    /// Resolve a query-style request to its backend URL.
    pub fn target_for(&self, request: &ProxyRequest) -> Result<(ResolvedPath, Url), GatewayError> {
        let resolved = self
            .endpoints
            .resolve(&request.endpoint, request.path_param.as_deref())?;
        let url = build_target(&self.base_url, &resolved, TargetQuery::Pairs(&request.query))?;
        Ok((resolved, url))
    }

    /// Resolve the path below a prefix mount to its backend URL.
    pub fn target_for_prefixed(
        &self,
        rest: &str,
        raw_query: Option<&str>,
    ) -> Result<(ResolvedPath, Url), GatewayError> {
        let resolved = self.endpoints.resolve_prefixed(rest)?;
        let url = build_target(&self.base_url, &resolved, TargetQuery::Raw(raw_query))?;
        Ok((resolved, url))
    }
}

/// The diagnostic gateway shared by every mount.
pub struct Gateway {
    runtime: ArcSwap<Runtime>,
}

impl Gateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            runtime: ArcSwap::from_pointee(Runtime::from_config(config)?),
        })
    }

    /// Replace the runtime snapshot. In-flight requests keep the old one.
    pub fn reload(&self, config: &GatewayConfig) -> Result<(), ConfigError> {
        let runtime = Runtime::from_config(config)?;
        tracing::info!(
            api_url = %runtime.base_url,
            endpoints = runtime.endpoints.len(),
            strict = runtime.endpoints.is_strict(),
            "Gateway configuration reloaded"
        );
        self.runtime.store(Arc::new(runtime));
        Ok(())
    }

    /// Current runtime snapshot.
    pub fn snapshot(&self) -> Arc<Runtime> {
        self.runtime.load_full()
    }

    /// Serve a query-style request.
    pub async fn handle(
        &self,
        mount: &MountConfig,
        request: &ProxyRequest,
        request_id: Option<&HeaderValue>,
    ) -> BackendResponse {
        let runtime = self.snapshot();
        let target = runtime.target_for(request);
        self.dispatch(&runtime, mount, target, request_id).await
    }

    /// Serve a request below a prefix mount.
    pub async fn handle_prefixed(
        &self,
        mount: &MountConfig,
        rest: &str,
        raw_query: Option<&str>,
        request_id: Option<&HeaderValue>,
    ) -> BackendResponse {
        let runtime = self.snapshot();
        let target = runtime.target_for_prefixed(rest, raw_query);
        self.dispatch(&runtime, mount, target, request_id).await
    }

    async fn dispatch(
        &self,
        runtime: &Runtime,
        mount: &MountConfig,
        target: Result<(ResolvedPath, Url), GatewayError>,
        request_id: Option<&HeaderValue>,
    ) -> BackendResponse {
        let start = Instant::now();
        let request_id_str = request_id.and_then(|v| v.to_str().ok()).unwrap_or("unknown");

        let (resolved, url) = match target {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id_str,
                    mount = %mount.path,
                    error = %e,
                    "Request rejected"
                );
                let response = BackendResponse::from_error(&e);
                metrics::record_request(&mount.path, "rejected", response.status.as_u16(), start);
                return response;
            }
        };

        // unlisted names are caller-controlled; keep them out of metric labels
        let endpoint_label = if resolved.is_listed() {
            resolved.endpoint()
        } else {
            "unlisted"
        };

        tracing::debug!(
            request_id = %request_id_str,
            endpoint = %resolved.endpoint(),
            target = %url,
            "Proxying request"
        );

        let policy = HeaderPolicy {
            forward_api_key: mount.forward_api_key,
            json_request_header: mount.json_request_header,
        };
        let headers = outbound_headers(policy, &runtime.credential, request_id);

        let response = match runtime.upstream.get(&url, headers).await {
            Ok(upstream) => {
                tracing::info!(
                    request_id = %request_id_str,
                    endpoint = %resolved.endpoint(),
                    status = upstream.status.as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                BackendResponse::relay(upstream, mount.body)
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id_str,
                    endpoint = %resolved.endpoint(),
                    target = %url,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_upstream_error(e.kind());
                BackendResponse::from_error(&e)
            }
        };

        metrics::record_request(&mount.path, endpoint_label, response.status.as_u16(), start);
        response
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("runtime", &self.runtime.load_full())
            .finish()
    }
}
