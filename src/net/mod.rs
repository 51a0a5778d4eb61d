//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS, certificate loading)
//!     → HTTP layer (axum)
//!     → WebSocket upgrade → connection.rs (tracked until closed)
//! ```
//!
//! # Design Decisions
//! - Each WebSocket connection is tracked for graceful shutdown
//! - TLS is optional and handled transparently

pub mod connection;
pub mod tls;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
