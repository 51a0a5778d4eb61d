//! Lifecycle controller.
//!
//! # States
//! ```text
//! Idle → Starting → Running → Stopping → Stopped
//!                                     ↘ Aborted   (stop outlived the timeout)
//! Starting → Idle                                 (start failed)
//! ```
//!
//! # Design Decisions
//! - Signals and service failures are raced in one select; first wins
//! - Stop runs in its own task so the timeout can observe it
//! - A timed-out stop is never awaited again; the caller must exit

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::lifecycle::signals::{self, TerminationSignal};
use crate::service::{Service, ServiceError, StopReason};

/// How long a graceful stop may take before the process is aborted.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
    Aborted,
}

/// What ended the running phase.
#[derive(Debug)]
pub enum ShutdownTrigger {
    /// An OS termination signal arrived.
    Signal(TerminationSignal),
    /// The service reported a fatal error.
    Failure(ServiceError),
    /// The service closed its failure channel without an error.
    Finished,
}

/// Errors that end the process after startup.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Start(ServiceError),

    #[error(transparent)]
    Service(ServiceError),

    #[error("shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}

/// Drives a service from start to a bounded graceful stop.
pub struct LifecycleController<S: Service> {
    service: Arc<S>,
    state: LifecycleState,
    failures: Option<mpsc::Receiver<ServiceError>>,
}

impl<S: Service> LifecycleController<S> {
    /// Wrap a service that has not been started yet.
    pub fn new(service: S) -> Self {
        Self {
            service: Arc::new(service),
            state: LifecycleState::Idle,
            failures: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The managed service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Start the service, returning its start error unchanged.
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        if self.state != LifecycleState::Idle {
            return Err(ServiceError::AlreadyStarted);
        }

        self.state = LifecycleState::Starting;
        match self.service.start().await {
            Ok(()) => {
                self.failures = self.service.failure_channel();
                self.state = LifecycleState::Running;
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Idle;
                Err(e)
            }
        }
    }

    /// Wait for an OS termination signal or a service failure.
    pub async fn wait_for_trigger(&mut self) -> ShutdownTrigger {
        self.wait_for_trigger_with(signals::termination_signal()).await
    }

    /// Like `wait_for_trigger`, with the signal source supplied by the caller.
    pub async fn wait_for_trigger_with<F>(&mut self, signal: F) -> ShutdownTrigger
    where
        F: Future<Output = std::io::Result<TerminationSignal>>,
    {
        let signal = async {
            match signal.await {
                Ok(received) => received,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for termination signals");
                    std::future::pending().await
                }
            }
        };

        let failures = &mut self.failures;
        let failure = async {
            match failures.as_mut() {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            received = signal => ShutdownTrigger::Signal(received),
            failure = failure => match failure {
                Some(e) => {
                    tracing::error!(error = %e, "Service reported failure");
                    ShutdownTrigger::Failure(e)
                }
                None => ShutdownTrigger::Finished,
            },
        }
    }

    /// Stop the service, giving up after `timeout`.
    ///
    /// A service failure trigger is returned as `LifecycleError::Service`
    /// once the stop completes.
    pub async fn shutdown(
        &mut self,
        trigger: ShutdownTrigger,
        timeout: Duration,
    ) -> Result<(), LifecycleError> {
        let (reason, failure) = match trigger {
            ShutdownTrigger::Signal(received) => (StopReason::Signal(received), None),
            ShutdownTrigger::Failure(e) => (StopReason::Failure(e.to_string()), Some(e)),
            ShutdownTrigger::Finished => (StopReason::Finished, None),
        };

        tracing::info!(reason = %reason, timeout = ?timeout, "Stopping service");
        self.state = LifecycleState::Stopping;
        self.failures = None;

        let service = Arc::clone(&self.service);
        let stop = tokio::spawn(async move { service.stop(reason).await });

        match tokio::time::timeout(timeout, stop).await {
            Ok(joined) => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Stop task failed");
                }
                self.state = LifecycleState::Stopped;
                tracing::info!("Service stopped");
                match failure {
                    Some(e) => Err(LifecycleError::Service(e)),
                    None => Ok(()),
                }
            }
            Err(_) => {
                self.state = LifecycleState::Aborted;
                tracing::error!(timeout = ?timeout, "Shutdown timed out");
                Err(LifecycleError::ShutdownTimeout(timeout))
            }
        }
    }

    /// Wait for a trigger, then shut down within `timeout`.
    pub async fn run(&mut self, timeout: Duration) -> Result<(), LifecycleError> {
        let trigger = self.wait_for_trigger().await;
        self.shutdown(trigger, timeout).await
    }
}
