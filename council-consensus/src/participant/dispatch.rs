use std::future;

use council_common::{NodeId, ProtocolMessage};
use council_p2p::InboundReceiver;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::outbox::Outbox;
use crate::role::Role;

/// The only task that ever touches a role's state.
pub(crate) struct Dispatcher<R: Role> {
    pub(crate) name: NodeId,
    pub(crate) role: R,
    pub(crate) inbox: InboundReceiver,
    pub(crate) commands: mpsc::UnboundedReceiver<R::Command>,
    pub(crate) status: watch::Sender<R::Snapshot>,
    pub(crate) outbox: Outbox,
    pub(crate) cancel: CancellationToken,
}

impl<R: Role> Dispatcher<R> {
    pub(crate) async fn run(mut self) {
        info!(node = %self.name, endpoint = %R::ENDPOINT, "dispatch loop started");

        loop {
            let deadline = self.role.deadline();

            let outbound = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(command) = self.commands.recv() => self.role.command(command),
                record = self.inbox.dequeue(&self.cancel) => {
                    let Some(record) = record else { break };
                    match ProtocolMessage::decode(&record) {
                        Ok(message) => {
                            debug!(node = %self.name, record = %record, "received");
                            let sender = message.participant_id.clone();
                            self.role.handle(message, &sender)
                        }
                        Err(e) => {
                            warn!(node = %self.name, error = %e, record = %record, "malformed record dropped");
                            continue;
                        }
                    }
                }
                _ = sleep_until(deadline) => self.role.on_deadline(),
            };

            self.outbox.post(outbound);
            self.status.send_replace(self.role.snapshot());
        }

        info!(node = %self.name, endpoint = %R::ENDPOINT, "dispatch loop stopped");
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => future::pending().await,
    }
}
