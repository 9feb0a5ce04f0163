//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, one route per mount)
//!     → request.rs (request ID)
//!     → gateway (resolve, forward)
//!     → response.rs (status, content type, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::BackendResponse;
pub use server::HttpServer;
