//! utils
//!
//! Small helper types shared across the council crates.

pub mod node_id;
pub use node_id::NodeId;
