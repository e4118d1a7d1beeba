use thiserror::Error;

use crate::env::message::MessageKind;

/// Failures while building or decoding a protocol record.
///
/// None of these are fatal: the dispatch loop logs them and drops the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("empty record")]
    Empty,

    #[error("{kind} expects {expected} fields, found {found}")]
    FieldCount {
        kind: MessageKind,
        expected: usize,
        found: usize,
    },

    #[error("unknown message kind: {0:?}")]
    UnknownKind(String),

    #[error("invalid proposal number: {0:?}")]
    InvalidProposalNumber(String),

    #[error("missing participant id")]
    MissingParticipant,

    #[error("participant id contains a reserved character: {0:?}")]
    InvalidParticipant(String),

    #[error("malformed promise payload: {0:?}")]
    MalformedPromise(String),

    #[error("{0} requires a value")]
    MissingValue(MessageKind),

    #[error("value contains a reserved character: {0:?}")]
    InvalidValue(String),
}
