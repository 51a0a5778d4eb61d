//! Gateway service: backend connection plus HTTP engine.
//!
//! # Responsibilities
//! - Connect the NATS client before accepting clients
//! - Bind the listen port, load TLS material when enabled
//! - Run the HTTP engine in its own task, reporting serve errors
//! - Stop: close the listener, drain WebSocket clients, close the backend

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::path::Path;
use std::sync::Mutex;

use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;

use crate::backend::NatsClient;
use crate::config::ResolvedConfig;
use crate::http::server::normalize_path;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::tls::load_tls_config;
use crate::net::ConnectionTracker;
use crate::observability::Logger;
use crate::service::{Service, ServiceError, StopReason};

const FAILURE_CAPACITY: usize = 4;

/// The realtime API gateway.
pub struct GatewayService {
    client: NatsClient,
    config: ResolvedConfig,
    logger: Logger,
    shutdown: Shutdown,
    connections: ConnectionTracker,
    started: AtomicBool,
    failures_tx: mpsc::Sender<ServiceError>,
    failures_rx: Mutex<Option<mpsc::Receiver<ServiceError>>>,
    server: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl GatewayService {
    pub fn new(client: NatsClient, config: ResolvedConfig, logger: Logger) -> Self {
        let (failures_tx, failures_rx) = mpsc::channel(FAILURE_CAPACITY);
        Self {
            client,
            config,
            logger,
            shutdown: Shutdown::new(),
            connections: ConnectionTracker::new(),
            started: AtomicBool::new(false),
            failures_tx,
            failures_rx: Mutex::new(Some(failures_rx)),
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Address the HTTP engine is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.lock().ok().and_then(|addr| *addr)
    }

    /// Number of connected WebSocket clients.
    pub fn connection_count(&self) -> u64 {
        self.connections.active_count()
    }

    async fn bind(&self) -> Result<(TcpListener, Option<RustlsConfig>), ServiceError> {
        let addr = self.config.listen_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServiceError::Bind { addr, source })?;

        let tls = if self.config.tls {
            let cert = self.config.tls_cert.as_deref().unwrap_or_default();
            let key = self.config.tls_key.as_deref().unwrap_or_default();
            let tls = load_tls_config(Path::new(cert), Path::new(key))
                .await
                .map_err(ServiceError::Tls)?;
            Some(tls)
        } else {
            None
        };

        Ok((listener, tls))
    }
}

/// Normalized `(ws_path, api_path)`.
fn route_paths(config: &ResolvedConfig) -> Result<(String, String), ServiceError> {
    let ws_path = normalize_path(&config.ws_path, false);
    let api_path = normalize_path(&config.api_path, true);

    if ws_path == api_path {
        return Err(ServiceError::InvalidPaths(format!(
            "WebSocket and API paths are both \"{}\"",
            ws_path
        )));
    }
    if let Some(path) = [&ws_path, &api_path]
        .into_iter()
        .find(|p| p.contains(['{', '}']))
    {
        return Err(ServiceError::InvalidPaths(format!(
            "\"{}\" contains a brace",
            path
        )));
    }

    Ok((ws_path, api_path))
}

impl Service for GatewayService {
    async fn start(&self) -> Result<(), ServiceError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyStarted);
        }

        let (ws_path, api_path) = route_paths(&self.config)?;

        self.client.connect(self.failures_tx.clone()).await?;

        let (listener, tls) = match self.bind().await {
            Ok(bound) => bound,
            Err(e) => {
                self.client.close().await;
                return Err(e);
            }
        };

        let local_addr = listener.local_addr().ok();
        if let Ok(mut addr) = self.local_addr.lock() {
            *addr = local_addr;
        }

        let state = AppState {
            connections: self.connections.clone(),
            shutdown: self.shutdown.clone(),
        };
        let server = HttpServer::new(&ws_path, &api_path, state);
        let shutdown = self.shutdown.clone();
        let failures = self.failures_tx.clone();

        let task = async move {
            let result = match tls {
                Some(tls) => server.run_tls(listener, tls, shutdown).await,
                None => server.run(listener, shutdown).await,
            };
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                let _ = failures.try_send(ServiceError::Serve(e));
            }
        };
        let handle = tokio::spawn(task.with_subscriber(self.logger.dispatch()));
        if let Ok(mut server) = self.server.lock() {
            *server = Some(handle);
        }

        self.logger.in_scope(|| {
            tracing::info!(
                port = self.config.port,
                ws_path = %ws_path,
                api_path = %api_path,
                tls = self.config.tls,
                header_auth = ?self.config.header_auth,
                "Gateway started"
            );
        });
        Ok(())
    }

    fn failure_channel(&self) -> Option<mpsc::Receiver<ServiceError>> {
        self.failures_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    async fn stop(&self, reason: StopReason) {
        self.logger
            .in_scope(|| tracing::info!(reason = %reason, "Stopping gateway"));
        self.shutdown.trigger();

        let server = self.server.lock().ok().and_then(|mut s| s.take());
        if let Some(server) = server {
            let _ = server.await;
        }

        self.connections.wait_drained().await;
        self.client.close().await;

        self.logger.in_scope(|| tracing::info!("Gateway stopped"));
    }
}
