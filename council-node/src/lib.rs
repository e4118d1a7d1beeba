pub mod cli;
pub mod config;
pub mod council;
pub mod error;
pub mod logging;

pub use config::{CouncilConfig, MemberConfig};
pub use council::Council;
pub use error::NodeError;
