//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Connect deadline lives on the connector; this covers the whole exchange
//! - Bound every inbound request by the deadline of the current snapshot
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout with a JSON body
//! - The inbound deadline is read per request, so reloads apply immediately

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::gateway::{Gateway, GatewayError};
use crate::http::request::request_id_str;

/// Extra time an inbound request gets on top of the upstream deadline.
pub const INBOUND_SLACK: Duration = Duration::from_secs(5);

/// Run `fut` under `deadline`, mapping expiry to [`GatewayError::Timeout`].
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(deadline)),
    }
}

/// Middleware bounding the whole inbound request.
///
/// The upstream deadline fires first in normal operation; this one only
/// catches time spent outside the upstream call.
pub async fn inbound_deadline(
    State(gateway): State<Arc<Gateway>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let deadline = gateway.snapshot().inbound_deadline();
    let request_id = request_id_str(request.headers()).to_string();

    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(request_id = %request_id, deadline_secs = deadline.as_secs(), "Inbound deadline exceeded");
            GatewayError::Timeout(deadline).into_response()
        }
    }
}
