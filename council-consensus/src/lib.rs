//! Single-decree Paxos for the council election.
//!
//! Each member runs an acceptor and, optionally, a proposer. Every role is a
//! participant with its own listener, inbound queue and a single dispatch task
//! that owns the role's state machine.

pub mod acceptor;
pub mod error;
pub mod member;
pub mod participant;
pub mod proposer;
pub mod quorum;
pub mod role;

#[cfg(test)]
mod testing;

pub use acceptor::{Acceptor, AcceptorSnapshot, AcceptorState};
pub use error::ConsensusError;
pub use member::{new_participant, new_participant_with_sender, AcceptorHandle, Member, ProposerHandle};
pub use participant::{ParticipantConfig, ParticipantHandle};
pub use proposer::{Proposer, ProposerCommand, ProposerPhase, ProposerState};
pub use quorum::{proposal_number, quorum_size};
pub use role::{Outbound, Role};
