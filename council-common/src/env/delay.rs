use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Simulated responsiveness of a member, applied before every outbound send.
///
/// The profile is fixed per participant; it models how reachable the member
/// is, not per-message jitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayProfile {
    #[default]
    Immediate,
    SmallDelay,
    LargeDelay,
    /// Never sends. Models a partitioned or unreachable member.
    NoResponse,
}

impl DelayProfile {
    pub const ALL: [DelayProfile; 4] = [
        DelayProfile::Immediate,
        DelayProfile::SmallDelay,
        DelayProfile::LargeDelay,
        DelayProfile::NoResponse,
    ];

    /// Wait applied before a send, or `None` when the send never happens.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            DelayProfile::Immediate => Some(Duration::ZERO),
            DelayProfile::SmallDelay => Some(Duration::from_millis(100)),
            DelayProfile::LargeDelay => Some(Duration::from_millis(1000)),
            DelayProfile::NoResponse => None,
        }
    }
}

impl fmt::Display for DelayProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DelayProfile::Immediate => "IMMEDIATE",
            DelayProfile::SmallDelay => "SMALL_DELAY",
            DelayProfile::LargeDelay => "LARGE_DELAY",
            DelayProfile::NoResponse => "NO_RESPONSE",
        };
        write!(f, "{}", s)
    }
}
