//! message.rs
//!
//! The four Paxos message kinds and their line-oriented wire encoding:
//!
//! ```text
//! PREPARE;<n>;<participant>
//! PROMISE;<n>;<participant>;<accepted value>:<accepted number>
//! ACCEPT;<n>;<participant>;<value>
//! ACCEPTED;<n>;<participant>;<value>
//! ```
//!
//! A PROMISE from an acceptor that has not accepted anything carries an empty
//! value and the [`NO_PROPOSAL`] sentinel, e.g. `PROMISE;3;M2;:-1`.

use std::fmt;
use std::str::FromStr;

use crate::error::MessageError;
use crate::utils::NodeId;

/// Sentinel proposal number meaning "nothing accepted yet".
pub const NO_PROPOSAL: i64 = -1;

const FIELD_SEPARATOR: char = ';';
const PROMISE_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Prepare,
    Promise,
    Accept,
    Accepted,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Prepare => "PREPARE",
            MessageKind::Promise => "PROMISE",
            MessageKind::Accept => "ACCEPT",
            MessageKind::Accepted => "ACCEPTED",
        }
    }

    fn field_count(&self) -> usize {
        match self {
            MessageKind::Prepare => 3,
            _ => 4,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREPARE" => Ok(MessageKind::Prepare),
            "PROMISE" => Ok(MessageKind::Promise),
            "ACCEPT" => Ok(MessageKind::Accept),
            "ACCEPTED" => Ok(MessageKind::Accepted),
            other => Err(MessageError::UnknownKind(other.to_string())),
        }
    }
}

/// Kind-specific payload of a [`ProtocolMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Prepare,
    /// The responder's previously accepted proposal, if any.
    Promise {
        accepted_value: Option<String>,
        accepted_number: i64,
    },
    Accept { value: String },
    Accepted { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolMessage {
    pub proposal_number: i64,
    pub participant_id: NodeId,
    pub body: MessageBody,
}

impl ProtocolMessage {
    pub fn prepare(proposal_number: i64, participant_id: NodeId) -> Result<Self, MessageError> {
        check_header(proposal_number, &participant_id)?;
        Ok(Self {
            proposal_number,
            participant_id,
            body: MessageBody::Prepare,
        })
    }

    /// PROMISE carrying what the acceptor accepted before, or nothing when
    /// `accepted` is `None`.
    pub fn promise(
        proposal_number: i64,
        participant_id: NodeId,
        accepted: Option<(i64, String)>,
    ) -> Result<Self, MessageError> {
        check_header(proposal_number, &participant_id)?;
        let body = match accepted {
            Some((number, value)) => {
                check_value(MessageKind::Promise, &value)?;
                if number < 0 {
                    return Err(MessageError::MalformedPromise(format!("{value}:{number}")));
                }
                MessageBody::Promise {
                    accepted_value: Some(value),
                    accepted_number: number,
                }
            }
            None => MessageBody::Promise {
                accepted_value: None,
                accepted_number: NO_PROPOSAL,
            },
        };
        Ok(Self {
            proposal_number,
            participant_id,
            body,
        })
    }

    pub fn accept(proposal_number: i64, participant_id: NodeId, value: impl Into<String>) -> Result<Self, MessageError> {
        let value = value.into();
        check_header(proposal_number, &participant_id)?;
        check_value(MessageKind::Accept, &value)?;
        Ok(Self {
            proposal_number,
            participant_id,
            body: MessageBody::Accept { value },
        })
    }

    pub fn accepted(proposal_number: i64, participant_id: NodeId, value: impl Into<String>) -> Result<Self, MessageError> {
        let value = value.into();
        check_header(proposal_number, &participant_id)?;
        check_value(MessageKind::Accepted, &value)?;
        Ok(Self {
            proposal_number,
            participant_id,
            body: MessageBody::Accepted { value },
        })
    }

    pub fn kind(&self) -> MessageKind {
        match self.body {
            MessageBody::Prepare => MessageKind::Prepare,
            MessageBody::Promise { .. } => MessageKind::Promise,
            MessageBody::Accept { .. } => MessageKind::Accept,
            MessageBody::Accepted { .. } => MessageKind::Accepted,
        }
    }

    /// The value carried by ACCEPT/ACCEPTED, or the previously accepted value
    /// of a PROMISE.
    pub fn value(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Prepare => None,
            MessageBody::Promise { accepted_value, .. } => accepted_value.as_deref(),
            MessageBody::Accept { value } | MessageBody::Accepted { value } => Some(value),
        }
    }

    /// Wire form, without the trailing newline.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn decode(record: &str) -> Result<Self, MessageError> {
        record.parse()
    }
}

impl fmt::Display for ProtocolMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.kind(), self.proposal_number, self.participant_id)?;
        match &self.body {
            MessageBody::Prepare => Ok(()),
            MessageBody::Promise {
                accepted_value,
                accepted_number,
            } => write!(
                f,
                ";{}{}{}",
                accepted_value.as_deref().unwrap_or(""),
                PROMISE_SEPARATOR,
                accepted_number
            ),
            MessageBody::Accept { value } | MessageBody::Accepted { value } => write!(f, ";{}", value),
        }
    }
}

impl FromStr for ProtocolMessage {
    type Err = MessageError;

    fn from_str(record: &str) -> Result<Self, Self::Err> {
        if record.is_empty() {
            return Err(MessageError::Empty);
        }

        let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
        let kind: MessageKind = fields[0].parse()?;
        if fields.len() != kind.field_count() {
            return Err(MessageError::FieldCount {
                kind,
                expected: kind.field_count(),
                found: fields.len(),
            });
        }

        let proposal_number = fields[1]
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .ok_or_else(|| MessageError::InvalidProposalNumber(fields[1].to_string()))?;

        if fields[2].is_empty() {
            return Err(MessageError::MissingParticipant);
        }
        let participant_id = NodeId::from(fields[2]);

        match kind {
            MessageKind::Prepare => Self::prepare(proposal_number, participant_id),
            MessageKind::Promise => {
                let accepted = parse_promise_payload(fields[3])?;
                Self::promise(proposal_number, participant_id, accepted)
            }
            MessageKind::Accept => Self::accept(proposal_number, participant_id, fields[3]),
            MessageKind::Accepted => Self::accepted(proposal_number, participant_id, fields[3]),
        }
    }
}

fn parse_promise_payload(payload: &str) -> Result<Option<(i64, String)>, MessageError> {
    let malformed = || MessageError::MalformedPromise(payload.to_string());

    let (value, number) = payload.rsplit_once(PROMISE_SEPARATOR).ok_or_else(malformed)?;
    let number: i64 = number.parse().map_err(|_| malformed())?;

    match (value.is_empty(), number) {
        (true, NO_PROPOSAL) => Ok(None),
        (false, n) if n >= 0 => Ok(Some((n, value.to_string()))),
        _ => Err(malformed()),
    }
}

/// Checks that `value` can travel as an ACCEPT/ACCEPTED payload.
pub fn validate_value(value: &str) -> Result<(), MessageError> {
    check_value(MessageKind::Accept, value)
}

/// Checks that `id` can travel as the participant field of a record.
pub fn validate_participant(id: &NodeId) -> Result<(), MessageError> {
    if id.as_str().is_empty() {
        return Err(MessageError::MissingParticipant);
    }
    if id.as_str().contains([FIELD_SEPARATOR, '\n', '\r']) {
        return Err(MessageError::InvalidParticipant(id.to_string()));
    }
    Ok(())
}

fn check_header(proposal_number: i64, participant_id: &NodeId) -> Result<(), MessageError> {
    if proposal_number < 0 {
        return Err(MessageError::InvalidProposalNumber(proposal_number.to_string()));
    }
    validate_participant(participant_id)
}

fn check_value(kind: MessageKind, value: &str) -> Result<(), MessageError> {
    if value.is_empty() {
        return Err(MessageError::MissingValue(kind));
    }
    if value.contains([FIELD_SEPARATOR, '\n', '\r']) {
        return Err(MessageError::InvalidValue(value.to_string()));
    }
    Ok(())
}
