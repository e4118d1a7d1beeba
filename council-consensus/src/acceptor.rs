//! acceptor.rs
//!
//! Vote-granting half of single-decree Paxos.
//!
//! An acceptor promises to ignore proposals numbered below the highest
//! PREPARE it has answered, and accepts any ACCEPT at or above that number.
//! Rejections are silent: no NACK is ever sent.

use std::convert::Infallible;

use council_common::{Endpoint, MessageBody, NodeId, PeerDirectory, ProtocolMessage, NO_PROPOSAL};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::role::{Outbound, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptorState {
    pub highest_promised: i64,
    pub accepted_proposal_number: i64,
    pub accepted_value: Option<String>,
}

impl Default for AcceptorState {
    fn default() -> Self {
        Self {
            highest_promised: NO_PROPOSAL,
            accepted_proposal_number: NO_PROPOSAL,
            accepted_value: None,
        }
    }
}

/// Published after every message the acceptor handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptorSnapshot {
    pub state: AcceptorState,
    /// Every `(proposal number, value)` accepted, in order.
    pub accepted_log: Vec<(i64, String)>,
}

pub struct Acceptor {
    identity: NodeId,
    peers: PeerDirectory,
    state: AcceptorState,
    accepted_log: Vec<(i64, String)>,
}

impl Acceptor {
    pub fn new(identity: NodeId, peers: PeerDirectory) -> Self {
        Self::with_state(identity, peers, AcceptorState::default())
    }

    /// Starts from an existing state, e.g. one that already accepted a value.
    pub fn with_state(identity: NodeId, peers: PeerDirectory, state: AcceptorState) -> Self {
        let accepted_log = match &state.accepted_value {
            Some(v) => vec![(state.accepted_proposal_number, v.clone())],
            None => Vec::new(),
        };
        Self {
            identity,
            peers,
            state,
            accepted_log,
        }
    }

    pub fn identity(&self) -> &NodeId {
        &self.identity
    }

    pub fn state(&self) -> &AcceptorState {
        &self.state
    }

    fn on_prepare(&mut self, n: i64, sender: &NodeId) -> Vec<Outbound> {
        if n <= self.state.highest_promised {
            debug!(n, highest = self.state.highest_promised, %sender, "PREPARE below promise ignored");
            return Vec::new();
        }
        self.state.highest_promised = n;

        let accepted = self
            .state
            .accepted_value
            .clone()
            .map(|v| (self.state.accepted_proposal_number, v));
        info!(target: "consensus", "EVENT:PROMISE acceptor={} n={} to={} prior={:?}", self.identity, n, sender, accepted);

        match ProtocolMessage::promise(n, self.identity.clone(), accepted) {
            Ok(promise) => self.reply(promise, sender),
            Err(e) => {
                warn!(error = %e, "could not build PROMISE");
                Vec::new()
            }
        }
    }

    fn on_accept(&mut self, n: i64, value: String, sender: &NodeId) -> Vec<Outbound> {
        if n < self.state.highest_promised {
            debug!(n, highest = self.state.highest_promised, %sender, "ACCEPT below promise ignored");
            return Vec::new();
        }
        // Accepting n implies having promised n.
        self.state.highest_promised = n;
        self.state.accepted_proposal_number = n;
        self.state.accepted_value = Some(value.clone());
        self.accepted_log.push((n, value.clone()));
        info!(target: "consensus", "EVENT:ACCEPTED acceptor={} n={} value={} from={}", self.identity, n, value, sender);

        match ProtocolMessage::accepted(n, self.identity.clone(), value) {
            Ok(accepted) => self.reply(accepted, sender),
            Err(e) => {
                warn!(error = %e, "could not build ACCEPTED");
                Vec::new()
            }
        }
    }

    fn reply(&self, message: ProtocolMessage, to: &NodeId) -> Vec<Outbound> {
        match self.peers.lookup(to) {
            Some(target) => vec![Outbound {
                message,
                target: target.clone(),
                endpoint: Endpoint::Proposer,
            }],
            None => {
                warn!(%to, "reply target is not a known member");
                Vec::new()
            }
        }
    }
}

impl Role for Acceptor {
    type Command = Infallible;
    type Snapshot = AcceptorSnapshot;

    const ENDPOINT: Endpoint = Endpoint::Acceptor;

    fn handle(&mut self, message: ProtocolMessage, sender: &NodeId) -> Vec<Outbound> {
        let n = message.proposal_number;
        match message.body {
            MessageBody::Prepare => self.on_prepare(n, sender),
            MessageBody::Accept { value } => self.on_accept(n, value, sender),
            other => {
                warn!(kind = ?other, %sender, "acceptor does not handle this message kind");
                Vec::new()
            }
        }
    }

    fn command(&mut self, command: Infallible) -> Vec<Outbound> {
        match command {}
    }

    fn snapshot(&self) -> AcceptorSnapshot {
        AcceptorSnapshot {
            state: self.state.clone(),
            accepted_log: self.accepted_log.clone(),
        }
    }
}
