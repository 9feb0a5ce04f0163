//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (mount path, endpoint name or path, pathParam)
//!     → matcher.rs (strip the mount prefix)
//!     → endpoints.rs (allow-list lookup, path parameter rule)
//!     → Return: ResolvedPath or a rejection
//!
//! Table compilation (at startup and on reload):
//!     EndpointsConfig
//!     → EndpointTable (name → backend path)
//!     → Frozen inside the runtime snapshot
//! ```
//!
//! # Design Decisions
//! - Tables compiled from config, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always resolves the same way
//! - Explicit rejection rather than silent default

pub mod endpoints;
pub mod matcher;

pub use endpoints::{normalize_endpoint, EndpointTable, ResolvedPath, API_PREFIX};
pub use matcher::PathPrefixMatcher;
