//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → connector connect timeout
//!     → timeouts.rs (deadline over request + body)
//!     → On failure: surfaced once as 502/504, never retried
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - At most one outbound call per inbound call: no retries, no circuit breaker

pub mod timeouts;
