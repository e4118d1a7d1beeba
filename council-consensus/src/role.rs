use std::fmt::Debug;

use council_common::{Endpoint, NodeId, NodeIdentity, PeerDirectory, ProtocolMessage};
use tokio::time::Instant;

/// A record a role wants delivered to one endpoint of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub message: ProtocolMessage,
    pub target: NodeIdentity,
    pub endpoint: Endpoint,
}

impl Outbound {
    /// One copy of `message` for every member's `endpoint`, self included.
    pub fn broadcast(peers: &PeerDirectory, message: &ProtocolMessage, endpoint: Endpoint) -> Vec<Outbound> {
        peers
            .iter()
            .map(|target| Outbound {
                message: message.clone(),
                target: target.clone(),
                endpoint,
            })
            .collect()
    }
}

/// Protocol behaviour plugged into a participant's dispatch loop.
///
/// Every method is called from that loop only, so implementations hold their
/// state without locks.
pub trait Role: Send + 'static {
    /// Requests from the owning handle, e.g. "start a proposal".
    type Command: Send + 'static;
    /// Read-only view published after every step.
    type Snapshot: Clone + Debug + Send + Sync + 'static;

    /// Which endpoint of the member this role listens on.
    const ENDPOINT: Endpoint;

    fn handle(&mut self, message: ProtocolMessage, sender: &NodeId) -> Vec<Outbound>;

    fn command(&mut self, command: Self::Command) -> Vec<Outbound>;

    /// Next moment `on_deadline` should fire, if any.
    fn deadline(&self) -> Option<Instant> {
        None
    }

    fn on_deadline(&mut self) -> Vec<Outbound> {
        Vec::new()
    }

    fn snapshot(&self) -> Self::Snapshot;
}
