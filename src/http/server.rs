//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per configured mount
//! - Wire up middleware (request ID, tracing, limits, deadline, headers)
//! - Bind server to listener
//! - Apply configuration updates to the gateway while serving
//! - Answer everything else with 404 `{"error":"Not Found"}`

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{HeaderMap, Request, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig, MountConfig, MountMode};
use crate::gateway::{Gateway, GatewayError, ProxyRequest};
use crate::http::request::{request_id, request_id_str, MakeRequestUuidV4, X_REQUEST_ID};
use crate::resilience::timeouts::inbound_deadline;
use crate::routing::PathPrefixMatcher;
use crate::security::headers::nosniff_layer;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// HTTP server for the diagnostic gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    gateway: Arc<Gateway>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let gateway = Arc::new(Gateway::new(&config)?);
        let state = AppState {
            gateway: gateway.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            gateway,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new();

        for mount in &config.mounts {
            router = match mount.mode {
                MountMode::Query => {
                    let path = mount.path.clone();
                    let mount = Arc::new(mount.clone());
                    router.route(
                        &path,
                        get(
                            move |State(state): State<AppState>,
                                  headers: HeaderMap,
                                  RawQuery(query): RawQuery| {
                                let mount = mount.clone();
                                async move { query_handler(state, &mount, headers, query).await }
                            },
                        ),
                    )
                }
                MountMode::Prefix => {
                    let path = mount.path.clone();
                    let mount = Arc::new(mount.clone());
                    let handler = get(
                        move |State(state): State<AppState>, uri: Uri, headers: HeaderMap| {
                            let mount = mount.clone();
                            async move { prefix_handler(state, &mount, uri, headers).await }
                        },
                    );
                    router
                        .route(&path, handler.clone())
                        .route(&format!("{}/{{*rest}}", path), handler)
                }
            };
        }

        let gateway = state.gateway.clone();
        let mut router = router
            .fallback(fallback_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(gateway, inbound_deadline));
        if config.security.enable_headers {
            router = router.layer(nosniff_layer());
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        request_id = %request_id_str(req.headers()),
                    )
                }))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size)),
        )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` are applied to the
    /// gateway; the server stops once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mounts = self.config.mounts.len(),
            "HTTP server starting"
        );

        let gateway = self.gateway.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = gateway.reload(&config) {
                    tracing::error!(error = %e, "Rejected configuration update");
                }
            }
        });

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// `?endpoint=...&pathParam=...` flavor.
async fn query_handler(
    state: AppState,
    mount: &MountConfig,
    headers: HeaderMap,
    query: Option<String>,
) -> Response {
    let request = ProxyRequest::from_query_string(query.as_deref());
    state
        .gateway
        .handle(mount, &request, request_id(&headers))
        .await
        .into_response()
}

/// `/api/<endpoint>[/<param>]` flavor.
async fn prefix_handler(state: AppState, mount: &MountConfig, uri: Uri, headers: HeaderMap) -> Response {
    let matcher = PathPrefixMatcher::new(mount.path.as_str());
    let Some(rest) = matcher.strip(uri.path()) else {
        return GatewayError::NotFound.into_response();
    };

    state
        .gateway
        .handle_prefixed(mount, rest, uri.query(), request_id(&headers))
        .await
        .into_response()
}

async fn fallback_handler(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No mount matched");
    GatewayError::NotFound.into_response()
}
