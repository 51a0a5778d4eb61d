//! Realtime API gateway launcher.
//!
//! Resolves the gateway configuration from defaults, a JSON file and the
//! command line, then runs the gateway service until a termination signal
//! or a service failure, stopping it within a bounded time.

pub mod backend;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod service;

pub use config::ResolvedConfig;
pub use lifecycle::{LifecycleController, Shutdown};
pub use observability::Logger;
pub use service::{GatewayService, Service, ServiceError};
