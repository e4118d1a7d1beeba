//! node.rs
//!
//! Identities of council members and the static directory of peers.
//!
//! Every member exposes two independent endpoints: one for its acceptor role
//! (target of PREPARE/ACCEPT) and one for its proposer role (target of
//! PROMISE/ACCEPTED).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::utils::NodeId;

/// Which role endpoint of a member a record is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Acceptor,
    Proposer,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Acceptor => write!(f, "acceptor"),
            Endpoint::Proposer => write!(f, "proposer"),
        }
    }
}

/// Immutable address card of a council member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIdentity {
    name: NodeId,
    host: String,
    acceptor_port: u16,
    proposer_port: u16,
}

impl NodeIdentity {
    pub fn new(name: impl Into<NodeId>, host: impl Into<String>, acceptor_port: u16, proposer_port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            acceptor_port,
            proposer_port,
        }
    }

    pub fn name(&self) -> &NodeId {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn acceptor_port(&self) -> u16 {
        self.acceptor_port
    }

    pub fn proposer_port(&self) -> u16 {
        self.proposer_port
    }

    pub fn port(&self, endpoint: Endpoint) -> u16 {
        match endpoint {
            Endpoint::Acceptor => self.acceptor_port,
            Endpoint::Proposer => self.proposer_port,
        }
    }

    /// `host:port` of the given endpoint, suitable for binding or dialing.
    pub fn socket_addr(&self, endpoint: Endpoint) -> String {
        format!("{}:{}", self.host, self.port(endpoint))
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} [{},{}]", self.name, self.host, self.acceptor_port, self.proposer_port)
    }
}

/// Ordered, read-only set of every member taking part in the election.
///
/// Cloning is cheap; all clones share the same backing slice. Membership is
/// fixed for the lifetime of the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDirectory {
    members: Arc<[NodeIdentity]>,
}

impl PeerDirectory {
    pub fn new(members: Vec<NodeIdentity>) -> Self {
        Self { members: members.into() }
    }

    /// Linear search by member name.
    pub fn lookup(&self, name: &NodeId) -> Option<&NodeIdentity> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Position of the named member in directory order.
    pub fn index_of(&self, name: &NodeId) -> Option<usize> {
        self.members.iter().position(|m| m.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeIdentity> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<NodeIdentity> for PeerDirectory {
    fn from_iter<T: IntoIterator<Item = NodeIdentity>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn council() -> PeerDirectory {
        (1..=3)
            .map(|i| NodeIdentity::new(format!("M{i}"), "localhost", 8000 + i, 9000 + i))
            .collect()
    }

    #[test]
    fn test_lookup_by_name() {
        let peers = council();
        let m2 = peers.lookup(&"M2".into()).expect("M2 is a member");
        assert_eq!(m2.acceptor_port(), 8002);
        assert_eq!(m2.port(Endpoint::Proposer), 9002);
        assert!(peers.lookup(&"M9".into()).is_none());
    }

    #[test]
    fn test_index_follows_directory_order() {
        let peers = council();
        assert_eq!(peers.index_of(&"M1".into()), Some(0));
        assert_eq!(peers.index_of(&"M3".into()), Some(2));
        assert_eq!(peers.len(), 3);
    }

    #[test]
    fn test_socket_addr() {
        let id = NodeIdentity::new("M4", "127.0.0.1", 8004, 9004);
        assert_eq!(id.socket_addr(Endpoint::Acceptor), "127.0.0.1:8004");
        assert_eq!(id.socket_addr(Endpoint::Proposer), "127.0.0.1:9004");
    }

    #[test]
    fn test_clones_share_members() {
        let peers = council();
        let other = peers.clone();
        assert_eq!(peers, other);
        assert_eq!(other.iter().count(), 3);
    }
}
