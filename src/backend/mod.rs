//! Backend messaging subsystem.
//!
//! # Data Flow
//! ```text
//! ResolvedConfig.nats_url + request_timeout
//!     → client.rs (connect within timeout, keep alive)
//!     → connection lost → ServiceError on the service failure channel
//! ```

pub mod client;

pub use client::NatsClient;
