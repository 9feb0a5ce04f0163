//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → body limit (tower-http, wired in http/server.rs)
//!     → routing allow-list (no unknown endpoint reaches the backend)
//!     → headers.rs (inject credential, drop client headers)
//! Outgoing response:
//!     → headers.rs (strip hop-by-hop, add nosniff)
//! ```
//!
//! # Design Decisions
//! - The API key lives only in the runtime snapshot, never in responses or logs
//! - Fail closed: unknown endpoints are rejected before any network call

pub mod headers;

pub use headers::{Credential, HeaderPolicy};
