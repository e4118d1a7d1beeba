//! proposer.rs
//!
//! Proposal-driving half of single-decree Paxos.
//!
//! A round moves `Idle -> Preparing -> Accepting -> Chosen`. Replies for any
//! other round, or arriving in the wrong phase, are logged and dropped.

use std::collections::HashSet;
use std::time::Duration;

use council_common::{validate_participant, Endpoint, MessageBody, NodeId, PeerDirectory, ProtocolMessage, NO_PROPOSAL};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::ConsensusError;
use crate::quorum::{proposal_number, quorum_size};
use crate::role::{Outbound, Role};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposerPhase {
    #[default]
    Idle,
    Preparing,
    Accepting,
    Chosen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerState {
    pub current_proposal_number: i64,
    pub proposed_value: Option<String>,
    pub promises_received: usize,
    pub acceptances_received: usize,
    /// Highest accepted proposal number reported by a PROMISE this round.
    pub highest_seen_proposal_number: i64,
    pub phase: ProposerPhase,
    pub chosen_value: Option<String>,
}

impl Default for ProposerState {
    fn default() -> Self {
        Self {
            current_proposal_number: NO_PROPOSAL,
            proposed_value: None,
            promises_received: 0,
            acceptances_received: 0,
            highest_seen_proposal_number: NO_PROPOSAL,
            phase: ProposerPhase::Idle,
            chosen_value: None,
        }
    }
}

impl ProposerState {
    pub fn is_chosen(&self) -> bool {
        self.phase == ProposerPhase::Chosen
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposerCommand {
    Start(String),
}

pub struct Proposer {
    identity: NodeId,
    peers: PeerDirectory,
    index: usize,
    round: i64,
    requested_value: Option<String>,
    state: ProposerState,
    promised_by: HashSet<NodeId>,
    accepted_by: HashSet<NodeId>,
    retry_after: Option<Duration>,
    round_started: Option<Instant>,
}

impl Proposer {
    pub fn new(identity: NodeId, peers: PeerDirectory) -> Result<Self, ConsensusError> {
        validate_participant(&identity)?;
        let index = peers
            .index_of(&identity)
            .ok_or_else(|| ConsensusError::UnknownSelf(identity.clone()))?;
        Ok(Self {
            identity,
            peers,
            index,
            round: 0,
            requested_value: None,
            state: ProposerState::default(),
            promised_by: HashSet::new(),
            accepted_by: HashSet::new(),
            retry_after: None,
            round_started: None,
        })
    }

    /// Restart an unfinished round after `retry_after`.
    pub fn with_retry(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn state(&self) -> &ProposerState {
        &self.state
    }

    pub fn quorum(&self) -> usize {
        quorum_size(self.peers.len())
    }

    /// Opens a new round for `value` and broadcasts PREPARE to every acceptor.
    pub fn start_proposal(&mut self, value: String) -> Vec<Outbound> {
        self.round += 1;
        let n = proposal_number(self.round, self.index, self.peers.len());

        self.requested_value = Some(value.clone());
        self.state = ProposerState {
            current_proposal_number: n,
            proposed_value: Some(value),
            phase: ProposerPhase::Preparing,
            ..ProposerState::default()
        };
        self.promised_by.clear();
        self.accepted_by.clear();
        self.round_started = Some(Instant::now());

        info!(target: "consensus", "EVENT:PREPARE proposer={} n={} value={:?}", self.identity, n, self.state.proposed_value);
        match ProtocolMessage::prepare(n, self.identity.clone()) {
            Ok(prepare) => Outbound::broadcast(&self.peers, &prepare, Endpoint::Acceptor),
            Err(e) => {
                warn!(error = %e, "could not build PREPARE");
                Vec::new()
            }
        }
    }

    fn on_promise(&mut self, n: i64, sender: &NodeId, accepted_value: Option<String>, accepted_number: i64) -> Vec<Outbound> {
        if self.state.phase != ProposerPhase::Preparing || n != self.state.current_proposal_number {
            debug!(n, current = self.state.current_proposal_number, phase = ?self.state.phase, %sender, "stale PROMISE ignored");
            return Vec::new();
        }
        if !self.promised_by.insert(sender.clone()) {
            debug!(n, %sender, "duplicate PROMISE ignored");
            return Vec::new();
        }
        self.state.promises_received = self.promised_by.len();

        if let Some(prior) = accepted_value {
            if accepted_number > self.state.highest_seen_proposal_number {
                if self.state.proposed_value.as_deref() != Some(prior.as_str()) {
                    info!(n, %sender, prior = %prior, prior_n = accepted_number, "adopting previously accepted value");
                }
                self.state.highest_seen_proposal_number = accepted_number;
                self.state.proposed_value = Some(prior);
            }
        }

        if self.state.promises_received < self.quorum() {
            return Vec::new();
        }

        self.state.phase = ProposerPhase::Accepting;
        let value = self.state.proposed_value.clone().unwrap_or_default();
        info!(target: "consensus", "EVENT:ACCEPT proposer={} n={} value={} promises={}", self.identity, n, value, self.state.promises_received);

        match ProtocolMessage::accept(n, self.identity.clone(), value) {
            Ok(accept) => Outbound::broadcast(&self.peers, &accept, Endpoint::Acceptor),
            Err(e) => {
                warn!(error = %e, "could not build ACCEPT");
                Vec::new()
            }
        }
    }

    fn on_accepted(&mut self, n: i64, sender: &NodeId, value: String) -> Vec<Outbound> {
        if self.state.phase != ProposerPhase::Accepting || n != self.state.current_proposal_number {
            debug!(n, current = self.state.current_proposal_number, phase = ?self.state.phase, %sender, "stale ACCEPTED ignored");
            return Vec::new();
        }
        if self.state.proposed_value.as_deref() != Some(value.as_str()) {
            warn!(n, %sender, value = %value, "ACCEPTED for a value this round never proposed");
            return Vec::new();
        }
        if !self.accepted_by.insert(sender.clone()) {
            debug!(n, %sender, "duplicate ACCEPTED ignored");
            return Vec::new();
        }
        self.state.acceptances_received = self.accepted_by.len();

        if self.state.acceptances_received >= self.quorum() {
            self.state.phase = ProposerPhase::Chosen;
            self.state.chosen_value = Some(value);
            info!(target: "consensus", "EVENT:CHOSEN proposer={} n={} value={:?} acceptances={}", self.identity, n, self.state.chosen_value, self.state.acceptances_received);
        }
        Vec::new()
    }
}

impl Role for Proposer {
    type Command = ProposerCommand;
    type Snapshot = ProposerState;

    const ENDPOINT: Endpoint = Endpoint::Proposer;

    fn handle(&mut self, message: ProtocolMessage, sender: &NodeId) -> Vec<Outbound> {
        let n = message.proposal_number;
        match message.body {
            MessageBody::Promise {
                accepted_value,
                accepted_number,
            } => self.on_promise(n, sender, accepted_value, accepted_number),
            MessageBody::Accepted { value } => self.on_accepted(n, sender, value),
            other => {
                warn!(kind = ?other, %sender, "proposer does not handle this message kind");
                Vec::new()
            }
        }
    }

    fn command(&mut self, command: ProposerCommand) -> Vec<Outbound> {
        match command {
            ProposerCommand::Start(value) => self.start_proposal(value),
        }
    }

    fn deadline(&self) -> Option<Instant> {
        match self.state.phase {
            ProposerPhase::Preparing | ProposerPhase::Accepting => Some(self.round_started? + self.retry_after?),
            _ => None,
        }
    }

    fn on_deadline(&mut self) -> Vec<Outbound> {
        let Some(value) = self.requested_value.clone() else {
            return Vec::new();
        };
        info!(n = self.state.current_proposal_number, phase = ?self.state.phase, "round timed out, starting a new one");
        self.start_proposal(value)
    }

    fn snapshot(&self) -> ProposerState {
        self.state.clone()
    }
}
