use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::TransportError;

/// Delivers one encoded record to `host:port`.
///
/// Delivery is at-most-once: failures are logged by the implementation and
/// never reported to the caller, and nothing is retried.
#[async_trait]
pub trait MessageSender: Send + Sync + Debug {
    async fn send(&self, record: String, host: &str, port: u16);
}

/// Opens a TCP connection per record, writes it as one line and closes.
#[derive(Debug, Clone)]
pub struct TcpSender {
    connect_timeout: Duration,
}

impl Default for TcpSender {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
        }
    }
}

impl TcpSender {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Like [`MessageSender::send`] but surfaces the failure.
    pub async fn try_send(&self, record: &str, host: &str, port: u16) -> Result<(), TransportError> {
        let addr = format!("{host}:{port}");

        let mut stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::Connect {
                addr: addr.clone(),
                reason: "timed out".to_string(),
            })?
            .map_err(|e| TransportError::Connect {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        stream.write_all(record.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.shutdown().await?;

        debug!(%addr, record = %record, "record sent");
        Ok(())
    }
}

#[async_trait]
impl MessageSender for TcpSender {
    async fn send(&self, record: String, host: &str, port: u16) {
        if let Err(e) = self.try_send(&record, host, port).await {
            warn!(error = %e, record = %record, "send abandoned");
        }
    }
}
