//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router for the WebSocket and resource API paths
//! - Wire up the trace layer
//! - Serve plain HTTP or HTTPS on an already bound listener
//! - Stop accepting when the service shutdown fires

use std::io;

use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::instrument::WithSubscriber;

use crate::http::websocket::websocket_handler;
use crate::lifecycle::shutdown::Shutdown;
use crate::net::ConnectionTracker;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub connections: ConnectionTracker,
    pub shutdown: Shutdown,
}

/// HTTP engine of the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server for normalized `ws_path` and `api_path`.
    pub fn new(ws_path: &str, api_path: &str, state: AppState) -> Self {
        Self {
            router: Self::build_router(ws_path, api_path, state),
        }
    }

    fn build_router(ws_path: &str, api_path: &str, state: AppState) -> Router {
        Router::new()
            .route(ws_path, get(websocket_handler))
            .route(api_path, any(api_handler))
            .route(&format!("{}{{*path}}", api_path), any(api_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve plain HTTP until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> io::Result<()> {
        tracing::info!(address = %listener.local_addr()?, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS until `shutdown` fires.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        shutdown: Shutdown,
    ) -> io::Result<()> {
        tracing::info!(address = %listener.local_addr()?, "HTTPS server starting");

        let listener = listener.into_std()?;
        let handle = axum_server::Handle::new();
        let trigger = handle.clone();
        let watcher = tokio::spawn(
            async move {
                shutdown.wait().await;
                trigger.graceful_shutdown(None);
            }
            .with_current_subscriber(),
        );

        let served = axum_server::from_tcp_rustls(listener, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await;
        watcher.abort();
        served?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Resource requests. No resource handlers are served by this engine.
async fn api_handler(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "Resource request");
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": { "code": "system.notFound", "message": "Not found" }
        })),
    )
        .into_response()
}

/// Ensure a leading slash, and a trailing one when `dir` is set.
pub fn normalize_path(path: &str, dir: bool) -> String {
    let mut out = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        out.push('/');
    }
    out.push_str(path);
    if dir && !out.ends_with('/') {
        out.push('/');
    }
    out
}
