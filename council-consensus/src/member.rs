//! member.rs
//!
//! A council member: an acceptor always, a proposer optionally. Each role is
//! its own participant on its own port.

use std::sync::Arc;
use std::time::Duration;

use council_common::{validate_participant, validate_value, NodeIdentity, PeerDirectory};
use council_p2p::{MessageSender, TcpSender};
use tokio::sync::watch;
use tracing::info;

use crate::acceptor::{Acceptor, AcceptorSnapshot};
use crate::error::ConsensusError;
use crate::participant::{ParticipantConfig, ParticipantHandle};
use crate::proposer::{Proposer, ProposerCommand, ProposerState};

/// Starts a member's roles over TCP.
pub async fn new_participant(
    identity: NodeIdentity,
    peers: PeerDirectory,
    config: ParticipantConfig,
    is_proposer: bool,
) -> Result<Member, ConsensusError> {
    new_participant_with_sender(identity, peers, config, is_proposer, Arc::new(TcpSender::default())).await
}

pub async fn new_participant_with_sender(
    identity: NodeIdentity,
    peers: PeerDirectory,
    config: ParticipantConfig,
    is_proposer: bool,
    sender: Arc<dyn MessageSender>,
) -> Result<Member, ConsensusError> {
    // Fail before binding anything: a name that cannot go on the wire, or a
    // proposer that could not number its rounds.
    validate_participant(identity.name())?;
    let proposer_role = if is_proposer {
        Some(Proposer::new(identity.name().clone(), peers.clone())?.with_retry(config.retry_after))
    } else {
        None
    };

    let acceptor = ParticipantHandle::start(
        Acceptor::new(identity.name().clone(), peers),
        identity.clone(),
        &config,
        Arc::clone(&sender),
    )
    .await?;

    let proposer = match proposer_role {
        Some(role) => match ParticipantHandle::start(role, identity.clone(), &config, sender).await {
            Ok(handle) => Some(ProposerHandle { inner: handle }),
            Err(e) => {
                acceptor.stop().await;
                return Err(e);
            }
        },
        None => None,
    };

    info!(member = %identity, delay = %config.delay, proposer = is_proposer, "member started");
    Ok(Member {
        identity,
        acceptor: AcceptorHandle { inner: acceptor },
        proposer,
    })
}

pub struct Member {
    identity: NodeIdentity,
    acceptor: AcceptorHandle,
    proposer: Option<ProposerHandle>,
}

impl Member {
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn acceptor(&self) -> &AcceptorHandle {
        &self.acceptor
    }

    pub fn proposer(&self) -> Option<&ProposerHandle> {
        self.proposer.as_ref()
    }

    pub fn is_proposer(&self) -> bool {
        self.proposer.is_some()
    }

    pub fn start_proposal(&self, value: impl Into<String>) -> Result<(), ConsensusError> {
        self.proposer
            .as_ref()
            .ok_or_else(|| ConsensusError::NotAProposer(self.identity.name().clone()))?
            .start_proposal(value)
    }

    pub async fn stop(self) {
        if let Some(proposer) = self.proposer {
            proposer.stop().await;
        }
        self.acceptor.stop().await;
    }
}

pub struct ProposerHandle {
    inner: ParticipantHandle<Proposer>,
}

impl ProposerHandle {
    /// Queues a new round for `value` on the proposer's dispatch task.
    pub fn start_proposal(&self, value: impl Into<String>) -> Result<(), ConsensusError> {
        let value = value.into();
        validate_value(&value)?;
        self.inner.send_command(ProposerCommand::Start(value))
    }

    pub fn status(&self) -> ProposerState {
        self.inner.snapshot()
    }

    pub fn is_chosen(&self) -> bool {
        self.inner.snapshot().is_chosen()
    }

    pub fn chosen_value(&self) -> Option<String> {
        self.inner.snapshot().chosen_value
    }

    pub fn subscribe(&self) -> watch::Receiver<ProposerState> {
        self.inner.subscribe()
    }

    /// Waits until this proposer's current round reaches CHOSEN.
    pub async fn wait_for_chosen(&self, timeout: Duration) -> Result<String, ConsensusError> {
        let mut status = self.inner.subscribe();
        let state = tokio::time::timeout(timeout, status.wait_for(ProposerState::is_chosen))
            .await
            .map_err(|_| ConsensusError::Timeout(timeout))?
            .map_err(|_| ConsensusError::Stopped)?
            .clone();
        state.chosen_value.ok_or(ConsensusError::Stopped)
    }

    pub async fn stop(self) {
        self.inner.stop().await;
    }
}

pub struct AcceptorHandle {
    inner: ParticipantHandle<Acceptor>,
}

impl AcceptorHandle {
    pub fn snapshot(&self) -> AcceptorSnapshot {
        self.inner.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AcceptorSnapshot> {
        self.inner.subscribe()
    }

    pub async fn stop(self) {
        self.inner.stop().await;
    }
}
