pub mod delay;
pub mod message;
pub mod node;
