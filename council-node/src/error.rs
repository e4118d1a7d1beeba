// council-node/src/error.rs
use thiserror::Error;

use council_consensus::ConsensusError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),
}
