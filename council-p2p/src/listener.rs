//! Accept loop for one role endpoint.
//!
//! Each accepted connection is served by its own short-lived task that reads
//! exactly one line and pushes it onto the inbound queue. Handlers never touch
//! protocol state.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::queue::InboundSender;

/// Longest record a connection may carry.
pub const MAX_RECORD_LEN: usize = 64 * 1024;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Listener;

impl Listener {
    /// Binds `host:port` and starts accepting in the background.
    ///
    /// Bind failures are returned; everything after that is logged.
    pub async fn bind(
        host: &str,
        port: u16,
        inbound: InboundSender,
        cancel: CancellationToken,
    ) -> Result<ListenerHandle, TransportError> {
        let addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::Bind { addr: addr.clone(), source })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening");

        let task = tokio::spawn(accept_loop(listener, inbound, cancel.clone()));

        Ok(ListenerHandle {
            local_addr,
            cancel,
            task,
        })
    }
}

/// Running accept loop. Dropping the handle stops accepting.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Closes the listening socket and waits for the accept loop to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "accept loop ended abnormally");
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn accept_loop(listener: TcpListener, inbound: InboundSender, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "connection accepted");
                    tokio::spawn(read_one_record(stream, inbound.clone()));
                }
                Err(e) if cancel.is_cancelled() => {
                    debug!(error = %e, "accept failed after stop");
                    break;
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
        }
    }
    // `listener` is dropped here, which closes the socket.
    info!("listener stopped");
}

async fn read_one_record(stream: TcpStream, inbound: InboundSender) {
    let mut lines = FramedRead::new(stream, LinesCodec::new_with_max_length(MAX_RECORD_LEN));

    match tokio::time::timeout(READ_TIMEOUT, lines.next()).await {
        Ok(Some(Ok(record))) => {
            if !inbound.enqueue(record) {
                debug!("inbound queue closed, record dropped");
            }
        }
        Ok(Some(Err(e))) => warn!(error = %TransportError::from(e), "unreadable record dropped"),
        Ok(None) => debug!("connection closed without a record"),
        Err(_) => warn!("connection idle for {:?}, dropped", READ_TIMEOUT),
    }
}
