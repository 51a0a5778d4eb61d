//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, trace layer)
//!     → ws_path  → websocket.rs (upgrade, tracked connection)
//!     → api_path → resource handler
//! ```

pub mod server;
pub mod websocket;

pub use server::{AppState, HttpServer};
