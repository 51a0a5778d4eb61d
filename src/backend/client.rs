//! Backend messaging client.
//!
//! # Responsibilities
//! - Validate the `nats://` endpoint
//! - Open the TCP connection within the request timeout
//! - Keep the connection alive (CONNECT after INFO, PONG for PING)
//! - Report a dropped connection on the service failure channel
//!
//! Messaging itself (subjects, requests, subscriptions) is not handled here.

use std::sync::Mutex;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;

use crate::lifecycle::shutdown::Shutdown;
use crate::observability::Logger;
use crate::service::ServiceError;

/// Port used when the URL does not name one.
pub const DEFAULT_NATS_PORT: u16 = 4222;

const CONNECT_LINE: &str =
    "CONNECT {\"verbose\":false,\"pedantic\":false,\"name\":\"resgate\"}\r\n";
const PONG_LINE: &str = "PONG\r\n";

/// Connection to the NATS server.
pub struct NatsClient {
    url: String,
    request_timeout: Duration,
    logger: Logger,
    shutdown: Shutdown,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl NatsClient {
    /// Create an unconnected client.
    pub fn new(url: impl Into<String>, request_timeout: Duration, logger: Logger) -> Self {
        Self {
            url: url.into(),
            request_timeout,
            logger,
            shutdown: Shutdown::new(),
            monitor: Mutex::new(None),
        }
    }

    /// Connect and start watching the connection. A lost connection is sent
    /// on `failures`.
    pub async fn connect(&self, failures: mpsc::Sender<ServiceError>) -> Result<(), ServiceError> {
        let addr = server_address(&self.url)?;

        let connect = TcpStream::connect(addr.as_str());
        let connected = tokio::time::timeout(self.request_timeout, connect).await;
        let stream = match connected {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ServiceError::Connect { addr, source }),
            Err(_) => {
                return Err(ServiceError::ConnectTimeout {
                    addr,
                    timeout: self.request_timeout,
                })
            }
        };

        self.logger.in_scope(|| {
            tracing::info!(
                url = %self.url,
                request_timeout = ?self.request_timeout,
                "Connected to NATS server"
            );
        });

        let task = watch_connection(stream, self.shutdown.clone(), failures)
            .with_subscriber(self.logger.dispatch());
        let handle = tokio::spawn(task);
        if let Ok(mut monitor) = self.monitor.lock() {
            *monitor = Some(handle);
        }
        Ok(())
    }

    /// Close the connection and wait for the watcher to exit.
    pub async fn close(&self) {
        self.shutdown.trigger();
        let handle = self.monitor.lock().ok().and_then(|mut m| m.take());
        if let Some(handle) = handle {
            let _ = handle.await;
            self.logger.in_scope(|| tracing::debug!("NATS connection closed"));
        }
    }
}

/// `host:port` for a `nats://` URL.
pub fn server_address(raw: &str) -> Result<String, ServiceError> {
    let invalid = |reason: String| ServiceError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "nats" {
        return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host".to_string()))?;

    Ok(format!("{}:{}", host, url.port().unwrap_or(DEFAULT_NATS_PORT)))
}

async fn watch_connection(
    stream: TcpStream,
    shutdown: Shutdown,
    failures: mpsc::Sender<ServiceError>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let lost = loop {
        tokio::select! {
            _ = shutdown.wait() => {
                let _ = writer.shutdown().await;
                return;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(reply) = control_reply(&line) {
                        if let Err(e) = writer.write_all(reply.as_bytes()).await {
                            break e.to_string();
                        }
                    }
                }
                Ok(None) => break "connection closed by server".to_string(),
                Err(e) => break e.to_string(),
            },
        }
    };

    if shutdown.is_triggered() {
        return;
    }
    tracing::error!(reason = %lost, "NATS connection lost");
    let _ = failures.try_send(ServiceError::BackendDisconnected(lost));
}

fn control_reply(line: &str) -> Option<&'static str> {
    let op = line.split_whitespace().next()?;
    if op.eq_ignore_ascii_case("INFO") {
        Some(CONNECT_LINE)
    } else if op.eq_ignore_ascii_case("PING") {
        Some(PONG_LINE)
    } else {
        None
    }
}
