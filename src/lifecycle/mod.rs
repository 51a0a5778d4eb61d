//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     ResolvedConfig → NatsClient + GatewayService → controller.start()
//!
//! Running (controller.rs):
//!     first of { termination signal, service failure } → shutdown
//!
//! Shutdown (controller.rs, shutdown.rs):
//!     spawn service stop ──race── timeout
//!         stop first    → Stopped
//!         timeout first → Aborted, process exits
//!
//! Signals (signals.rs):
//!     SIGINT/SIGHUP/SIGTERM/SIGQUIT → graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then backend, then listener
//! - Shutdown has timeout: forced exit after deadline

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{
    LifecycleController, LifecycleError, LifecycleState, ShutdownTrigger, DEFAULT_STOP_TIMEOUT,
};
pub use shutdown::Shutdown;
pub use signals::TerminationSignal;
