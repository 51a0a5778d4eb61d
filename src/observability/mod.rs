//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config.debug
//!     → logging.rs (Logger: tracing dispatcher + env filter)
//!     → installed globally by the binary
//!     → attached to backend client and gateway tasks
//! ```

pub mod logging;

pub use logging::Logger;
