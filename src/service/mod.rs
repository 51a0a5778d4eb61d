//! Service seam between the lifecycle controller and the gateway engine.
//!
//! # Data Flow
//! ```text
//! lifecycle::startup
//!     → backend::NatsClient::new(url, timeout, logger)
//!     → GatewayService::new(client, config, logger)
//!     → LifecycleController drives Service::start / failure_channel / stop
//! ```

pub mod gateway;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::lifecycle::signals::TerminationSignal;

pub use gateway::GatewayService;

/// Errors reported by a service, either from `start` or on its failure channel.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid NATS URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to connect to NATS server at {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("timed out connecting to NATS server at {addr} after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("lost connection to NATS server: {0}")]
    BackendDisconnected(String),

    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("failed to load TLS certificate: {0}")]
    Tls(#[source] std::io::Error),

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("invalid HTTP paths: {0}")]
    InvalidPaths(String),

    #[error("service already started")]
    AlreadyStarted,
}

/// Why a service is being stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// An OS termination signal arrived.
    Signal(TerminationSignal),
    /// The service reported a failure.
    Failure(String),
    /// The service ended on its own.
    Finished,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Signal(signal) => write!(f, "received {}", signal),
            StopReason::Failure(message) => write!(f, "service failure: {}", message),
            StopReason::Finished => write!(f, "service finished"),
        }
    }
}

/// A long-running network service managed by the lifecycle controller.
pub trait Service: Send + Sync + 'static {
    /// Start serving. Errors are returned to the caller unchanged.
    fn start(&self) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Channel on which the running service reports fatal errors.
    ///
    /// Can be taken once; later calls return `None`. The channel closing
    /// without a message means the service ended on its own.
    fn failure_channel(&self) -> Option<mpsc::Receiver<ServiceError>>;

    /// Release every resource held by the service.
    fn stop(&self, reason: StopReason) -> impl Future<Output = ()> + Send;
}
