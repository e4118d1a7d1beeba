use std::time::Duration;

use council_common::{MessageError, NodeId};
use council_p2p::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid message: {0}")]
    Message(#[from] MessageError),

    #[error("{0} is not listed in its own peer directory")]
    UnknownSelf(NodeId),

    #[error("{0} does not run a proposer")]
    NotAProposer(NodeId),

    #[error("participant has stopped")]
    Stopped,

    #[error("no value chosen within {0:?}")]
    Timeout(Duration),
}
