//! Configuration schema definitions.
//!
//! `ResolvedConfig` is what the gateway runs with. `PartialConfig` is one
//! configuration layer (defaults, file, or command line) where every field
//! may be missing; layers are merged field by field in `loader.rs`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend messaging endpoint.
pub const DEFAULT_NATS_URL: &str = "nats://127.0.0.1:4222";

/// Default timeout for backend requests, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default path prefix for WebSocket clients.
pub const DEFAULT_WS_PATH: &str = "/";

/// Default path prefix for the resource API.
pub const DEFAULT_API_PATH: &str = "/api/";

/// Final runtime configuration for the gateway.
///
/// Built once per process by the loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    /// Backend messaging endpoint.
    pub nats_url: String,

    /// Timeout for backend requests in seconds.
    pub request_timeout: u64,

    /// Verbose logging.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,

    /// HTTP listen port, always in `1..=65535`.
    pub port: u16,

    /// Path prefix for WebSocket clients.
    pub ws_path: String,

    /// Path prefix for the resource API.
    pub api_path: String,

    /// Resource method used for header authentication.
    #[serde(default, alias = "headauth", skip_serializing_if = "Option::is_none")]
    pub header_auth: Option<String>,

    /// Serve HTTP over TLS.
    #[serde(default)]
    pub tls: bool,

    /// Certificate file (PEM) used when `tls` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert: Option<String>,

    /// Private key file (PEM) used when `tls` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_key: Option<String>,
}

impl ResolvedConfig {
    /// Backend request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Socket address the HTTP engine binds to.
    pub fn listen_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            nats_url: DEFAULT_NATS_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            debug: false,
            port: DEFAULT_PORT,
            ws_path: DEFAULT_WS_PATH.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            header_auth: None,
            tls: false,
            tls_cert: None,
            tls_key: None,
        }
    }
}

/// One configuration layer.
///
/// Deserializes from the persisted file format. Zero numbers and empty
/// strings are read as "not set", the same way the file has always been
/// interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialConfig {
    pub nats_url: Option<String>,
    pub request_timeout: Option<u64>,
    pub debug: Option<bool>,
    /// Kept wider than `u16` so out-of-range values reach validation.
    pub port: Option<u64>,
    pub ws_path: Option<String>,
    pub api_path: Option<String>,
    #[serde(alias = "headauth")]
    pub header_auth: Option<String>,
    pub tls: Option<bool>,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
}

impl PartialConfig {
    /// The built-in defaults as a layer.
    pub fn defaults() -> Self {
        let d = ResolvedConfig::default();
        Self {
            nats_url: Some(d.nats_url),
            request_timeout: Some(d.request_timeout),
            debug: Some(d.debug),
            port: Some(u64::from(d.port)),
            ws_path: Some(d.ws_path),
            api_path: Some(d.api_path),
            header_auth: None,
            tls: Some(d.tls),
            tls_cert: None,
            tls_key: None,
        }
    }

    /// Drop zero and empty values so they fall through to lower layers.
    pub fn normalized(self) -> Self {
        Self {
            nats_url: non_empty(self.nats_url),
            request_timeout: self.request_timeout.filter(|t| *t > 0),
            debug: self.debug,
            port: self.port.filter(|p| *p > 0),
            ws_path: non_empty(self.ws_path),
            api_path: non_empty(self.api_path),
            header_auth: non_empty(self.header_auth),
            tls: self.tls,
            tls_cert: non_empty(self.tls_cert),
            tls_key: non_empty(self.tls_key),
        }
    }

    /// Unset the field behind command-line argument `id`.
    pub fn clear(&mut self, id: &str) {
        match id {
            "nats_url" => self.nats_url = None,
            "request_timeout" => self.request_timeout = None,
            "port" => self.port = None,
            "ws_path" => self.ws_path = None,
            "api_path" => self.api_path = None,
            "header_auth" => self.header_auth = None,
            "tls" => self.tls = None,
            "tls_cert" => self.tls_cert = None,
            "tls_key" => self.tls_key = None,
            _ => {}
        }
    }

    /// Fill every field missing here from `lower`.
    pub fn or(self, lower: PartialConfig) -> Self {
        Self {
            nats_url: self.nats_url.or(lower.nats_url),
            request_timeout: self.request_timeout.or(lower.request_timeout),
            debug: self.debug.or(lower.debug),
            port: self.port.or(lower.port),
            ws_path: self.ws_path.or(lower.ws_path),
            api_path: self.api_path.or(lower.api_path),
            header_auth: self.header_auth.or(lower.header_auth),
            tls: self.tls.or(lower.tls),
            tls_cert: self.tls_cert.or(lower.tls_cert),
            tls_key: self.tls_key.or(lower.tls_key),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
