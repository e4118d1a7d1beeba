//! Shared types for the council election: node identities, the peer
//! directory, delay profiles and the Paxos wire protocol.

pub mod env;
pub mod error;
pub mod utils;

pub use env::delay::DelayProfile;
pub use env::message::{validate_participant, validate_value, MessageBody, MessageKind, ProtocolMessage, NO_PROPOSAL};
pub use env::node::{Endpoint, NodeIdentity, PeerDirectory};
pub use error::MessageError;
pub use utils::NodeId;
