//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply API_URL / API_KEY)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into a gateway runtime snapshot
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the runtime snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - Environment is read once, inside the loader
//! - All fields have defaults to allow minimal configs
//! - Listener and mounts are fixed at startup; reload covers the backend,
//!   endpoint table, timeouts and limits

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, override_bind_address, ConfigError};
pub use schema::{
    BackendConfig, BodyMode, EndpointConfig, EndpointsConfig, GatewayConfig, ListenerConfig,
    MountConfig, MountMode, PathParamRule, PLACEHOLDER_API_KEY,
};
pub use validation::ValidationError;
