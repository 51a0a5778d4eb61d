//! Structured logging.
//!
//! # Responsibilities
//! - Build the logging sink from the debug flag
//! - Hand the same sink to the backend client and the gateway service
//! - Install it as the process-wide default in the binary
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the debug flag when set
//! - Logs go to stderr

use tracing::Dispatch;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Cheap-to-clone handle to the logging sink.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    debug: bool,
}

impl Logger {
    /// Create a sink logging at debug level when `debug` is set, info otherwise.
    pub fn new(debug: bool) -> Self {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

        Self {
            dispatch: Dispatch::new(subscriber),
            debug,
        }
    }

    /// Install as the global default. Returns false if one was already set.
    pub fn install(&self) -> bool {
        tracing::dispatcher::set_global_default(self.dispatch.clone()).is_ok()
    }

    /// The dispatcher to attach to spawned tasks.
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch.clone()
    }

    /// Run `f` with this sink as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("debug", &self.debug).finish()
    }
}

fn default_directives(debug: bool) -> &'static str {
    if debug {
        "resgate=debug,tower_http=debug"
    } else {
        "resgate=info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(true), "resgate=debug,tower_http=debug");
        assert_eq!(default_directives(false), "resgate=info");
    }

    #[test]
    fn test_debug_flag_in_debug_output() {
        assert!(format!("{:?}", Logger::new(true)).contains("debug: true"));
        assert!(format!("{:?}", Logger::new(false).clone()).contains("debug: false"));
    }
}
