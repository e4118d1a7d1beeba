use std::sync::Arc;

use council_common::{DelayProfile, NodeId};
use council_p2p::MessageSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::role::Outbound;

/// Sends a participant's outbound records, each on its own task, after the
/// participant's simulated delay.
///
/// A stalled send (large delay or `NoResponse`) never holds up the others,
/// and every pending send is released when the participant stops.
#[derive(Debug, Clone)]
pub(crate) struct Outbox {
    name: NodeId,
    delay: DelayProfile,
    sender: Arc<dyn MessageSender>,
    cancel: CancellationToken,
}

impl Outbox {
    pub(crate) fn new(name: NodeId, delay: DelayProfile, sender: Arc<dyn MessageSender>, cancel: CancellationToken) -> Self {
        Self {
            name,
            delay,
            sender,
            cancel,
        }
    }

    pub(crate) fn post(&self, outbound: Vec<Outbound>) {
        for out in outbound {
            self.send_to(out);
        }
    }

    fn send_to(&self, out: Outbound) {
        let record = out.message.encode();
        let host = out.target.host().to_string();
        let port = out.target.port(out.endpoint);
        let delay = self.delay;
        let sender = Arc::clone(&self.sender);
        let cancel = self.cancel.clone();
        let from = self.name.clone();

        tokio::spawn(async move {
            match delay.delay() {
                Some(wait) if !wait.is_zero() => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(%from, record = %record, "delayed send cancelled");
                            return;
                        }
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
                Some(_) => {}
                None => {
                    trace!(%from, record = %record, "withholding send");
                    cancel.cancelled().await;
                    return;
                }
            }
            if cancel.is_cancelled() {
                return;
            }
            sender.send(record, &host, port).await;
        });
    }
}
