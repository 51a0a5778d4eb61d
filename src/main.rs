//! resgate
//!
//! ```text
//!   args ──▶ config::args ──▶ config::loader ──▶ ResolvedConfig
//!                                  │   ▲
//!                     bootstrap ◀──┘   └── config file (JSON)
//!
//!   ResolvedConfig ──▶ lifecycle::startup ──▶ NatsClient + GatewayService
//!                                                 │
//!   signals ─┐                                    ▼
//!            ├──▶ LifecycleController ──▶ stop (bounded by timeout)
//!   failure ─┘
//! ```

use std::process::ExitCode;

use resgate::config::{self, ArgsError};
use resgate::lifecycle::{startup, LifecycleError, DEFAULT_STOP_TIMEOUT};
use resgate::Logger;

#[tokio::main]
async fn main() -> ExitCode {
    let parsed = match config::parse_args(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(ArgsError::Help(text)) => {
            println!("{}", text);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", config::args::usage());
            return ExitCode::from(2);
        }
    };

    let resolution = match config::resolve(&parsed) {
        Ok(resolution) => resolution,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = resolution.config;

    let logger = Logger::new(config.debug);
    logger.install();

    if let Some(bootstrap) = &resolution.bootstrap {
        bootstrap.log();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        nats_url = %config.nats_url,
        port = config.port,
        "resgate starting"
    );

    let mut controller = match startup::launch(&config, &logger).await {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match controller.run(DEFAULT_STOP_TIMEOUT).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e @ LifecycleError::ShutdownTimeout(_)) => {
            eprintln!("{}", e);
            // The stop task may still hold resources; do not wait for the runtime.
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
