//! SAIF diagnostic gateway library.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use gateway::{Gateway, GatewayError, ProxyRequest};
pub use http::{BackendResponse, HttpServer};
pub use lifecycle::Shutdown;
