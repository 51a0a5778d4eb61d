//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for the termination signals (SIGINT, SIGHUP, SIGTERM, SIGQUIT)
//! - Resolve with the first one that arrives
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP stops the gateway; there is no reload
//! - Ctrl+C only on non-unix targets

/// A signal that requests process termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Hangup,
    Terminate,
    Quit,
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Hangup => "SIGHUP",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

/// Wait for the first termination signal.
#[cfg(unix)]
pub async fn termination_signal() -> std::io::Result<TerminationSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = interrupt.recv() => TerminationSignal::Interrupt,
        _ = hangup.recv() => TerminationSignal::Hangup,
        _ = terminate.recv() => TerminationSignal::Terminate,
        _ = quit.recv() => TerminationSignal::Quit,
    };

    tracing::info!(signal = %received, "Shutdown signal received");
    Ok(received)
}

/// Wait for the first termination signal.
#[cfg(not(unix))]
pub async fn termination_signal() -> std::io::Result<TerminationSignal> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = %TerminationSignal::Interrupt, "Shutdown signal received");
    Ok(TerminationSignal::Interrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(TerminationSignal::Hangup.to_string(), "SIGHUP");
        assert_eq!(TerminationSignal::Quit.to_string(), "SIGQUIT");
    }
}
