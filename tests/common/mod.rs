//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use resgate::service::{Service, ServiceError, StopReason};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Start a fake NATS server that greets with INFO and keeps the connection
/// open until the client goes away.
pub async fn start_fake_nats() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (reader, mut writer) = socket.into_split();
                let _ = writer.write_all(b"INFO {}\r\n").await;
                let mut lines = BufReader::new(reader).lines();
                while let Ok(Some(_)) = lines.next_line().await {}
            });
        }
    });

    addr
}

/// A port that was free a moment ago.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Service double with a controllable stop duration.
pub struct MockService {
    pub stop_delay: Duration,
    pub starts: AtomicUsize,
    pub stops: Mutex<Vec<StopReason>>,
    failures: Mutex<Option<mpsc::Receiver<ServiceError>>>,
}

impl MockService {
    /// Returns the service and the sender side of its failure channel.
    pub fn new(stop_delay: Duration) -> (Self, mpsc::Sender<ServiceError>) {
        let (tx, rx) = mpsc::channel(1);
        let service = Self {
            stop_delay,
            starts: AtomicUsize::new(0),
            stops: Mutex::new(Vec::new()),
            failures: Mutex::new(Some(rx)),
        };
        (service, tx)
    }

    pub fn stop_reasons(&self) -> Vec<StopReason> {
        self.stops.lock().unwrap().clone()
    }
}

impl Service for MockService {
    async fn start(&self) -> Result<(), ServiceError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn failure_channel(&self) -> Option<mpsc::Receiver<ServiceError>> {
        self.failures.lock().unwrap().take()
    }

    async fn stop(&self, reason: StopReason) {
        self.stops.lock().unwrap().push(reason);
        tokio::time::sleep(self.stop_delay).await;
    }
}
