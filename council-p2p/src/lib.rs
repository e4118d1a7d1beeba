//! Point-to-point plumbing between council members: a fire-and-forget TCP
//! sender, a one-record-per-connection listener and the inbound queue that
//! hands records to a single dispatch loop.

pub mod error;
pub mod listener;
pub mod queue;
pub mod sender;

pub use error::TransportError;
pub use listener::{Listener, ListenerHandle, MAX_RECORD_LEN};
pub use queue::{inbound_queue, InboundReceiver, InboundSender};
pub use sender::{MessageSender, TcpSender};
