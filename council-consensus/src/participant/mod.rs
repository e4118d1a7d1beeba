//! participant
//!
//! Runtime shared by both roles: a listener on the role's endpoint, an
//! inbound queue, one dispatch task owning the role, and an outbox applying
//! the member's delay profile.

mod dispatch;
mod outbox;

use std::sync::Arc;
use std::time::Duration;

use council_common::{DelayProfile, NodeIdentity};
use council_p2p::{inbound_queue, InboundReceiver, Listener, ListenerHandle, MessageSender};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::error::ConsensusError;
use crate::role::Role;
use dispatch::Dispatcher;
use outbox::Outbox;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantConfig {
    pub delay: DelayProfile,
    /// Upper bound on waiting for the dispatch task during `stop`.
    pub stop_timeout: Duration,
    /// Proposers only: restart a round that has not finished in this time.
    pub retry_after: Option<Duration>,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            delay: DelayProfile::Immediate,
            stop_timeout: Duration::from_secs(2),
            retry_after: None,
        }
    }
}

impl ParticipantConfig {
    pub fn with_delay(delay: DelayProfile) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

/// A running role. Dropping the handle cancels its tasks; `stop` also waits
/// for them.
pub struct ParticipantHandle<R: Role> {
    identity: NodeIdentity,
    commands: mpsc::UnboundedSender<R::Command>,
    status: watch::Receiver<R::Snapshot>,
    cancel: CancellationToken,
    dispatch: JoinHandle<()>,
    listener: Option<ListenerHandle>,
    stop_timeout: Duration,
}

impl<R: Role> ParticipantHandle<R> {
    /// Binds the role's endpoint and spawns its dispatch task.
    ///
    /// A bind failure is the only error; it is returned before anything runs.
    pub async fn start(
        role: R,
        identity: NodeIdentity,
        config: &ParticipantConfig,
        sender: Arc<dyn MessageSender>,
    ) -> Result<Self, ConsensusError> {
        let cancel = CancellationToken::new();
        let (inbound_tx, inbound_rx) = inbound_queue();
        let listener = Listener::bind(
            identity.host(),
            identity.port(R::ENDPOINT),
            inbound_tx,
            cancel.child_token(),
        )
        .await?;

        let mut handle = Self::spawn(role, identity, config, sender, inbound_rx, cancel);
        handle.listener = Some(listener);
        Ok(handle)
    }

    /// Spawns the dispatch task over an existing inbound queue, without a
    /// listener.
    pub fn spawn(
        role: R,
        identity: NodeIdentity,
        config: &ParticipantConfig,
        sender: Arc<dyn MessageSender>,
        inbox: InboundReceiver,
        cancel: CancellationToken,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(role.snapshot());
        let outbox = Outbox::new(identity.name().clone(), config.delay, sender, cancel.child_token());

        let span = tracing::info_span!("participant", node = %identity.name(), endpoint = %R::ENDPOINT);
        let dispatcher = Dispatcher {
            name: identity.name().clone(),
            role,
            inbox,
            commands: commands_rx,
            status: status_tx,
            outbox,
            cancel: cancel.clone(),
        };
        let dispatch = tokio::spawn(dispatcher.run().instrument(span));

        Self {
            identity,
            commands: commands_tx,
            status: status_rx,
            cancel,
            dispatch,
            listener: None,
            stop_timeout: config.stop_timeout,
        }
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Address the listener is bound to, if this participant has one.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    pub fn send_command(&self, command: R::Command) -> Result<(), ConsensusError> {
        self.commands.send(command).map_err(|_| ConsensusError::Stopped)
    }

    /// Latest state published by the dispatch task.
    pub fn snapshot(&self) -> R::Snapshot {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<R::Snapshot> {
        self.status.clone()
    }

    /// Cancels the dispatch loop and pending sends, waits (bounded) for the
    /// loop to exit and closes the listener.
    pub async fn stop(mut self) {
        self.cancel.cancel();

        match tokio::time::timeout(self.stop_timeout, &mut self.dispatch).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(node = %self.identity.name(), error = %e, "dispatch task failed"),
            Err(_) => {
                warn!(node = %self.identity.name(), "dispatch task did not stop in {:?}, aborting", self.stop_timeout);
                self.dispatch.abort();
            }
        }

        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }
        info!(node = %self.identity.name(), endpoint = %R::ENDPOINT, "participant stopped");
    }
}

impl<R: Role> Drop for ParticipantHandle<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
