use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use council_common::{DelayProfile, NodeIdentity, PeerDirectory};
use council_consensus::ParticipantConfig;
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// One council member as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub name: String,
    pub host: String,
    pub acceptor_port: u16,
    pub proposer_port: u16,
    #[serde(default)]
    pub delay: DelayProfile,
    #[serde(default)]
    pub proposer: bool,
}

impl MemberConfig {
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::new(self.name.as_str(), self.host.as_str(), self.acceptor_port, self.proposer_port)
    }

    pub fn participant_config(&self, council: &CouncilConfig) -> ParticipantConfig {
        ParticipantConfig {
            delay: self.delay,
            stop_timeout: Duration::from_millis(council.stop_timeout_ms),
            retry_after: council.retry_after_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilConfig {
    pub members: Vec<MemberConfig>,
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    #[serde(default)]
    pub retry_after_ms: Option<u64>,
}

fn default_stop_timeout_ms() -> u64 {
    2000
}

impl CouncilConfig {
    /// The nine-member council: M1..M9 on consecutive ports, M1-M3 proposing.
    ///
    /// With `profiles` empty every member is immediate; otherwise member `Mk`
    /// gets `profiles[k % len]`, so M1 takes the second profile.
    pub fn nine_member(acceptor_base: u16, proposer_base: u16, profiles: &[DelayProfile]) -> Self {
        let members = (0..9u16)
            .map(|i| MemberConfig {
                name: format!("M{}", i + 1),
                host: "127.0.0.1".to_string(),
                acceptor_port: acceptor_base + i,
                proposer_port: proposer_base + i,
                delay: if profiles.is_empty() {
                    DelayProfile::Immediate
                } else {
                    profiles[(i as usize + 1) % profiles.len()]
                },
                proposer: i < 3,
            })
            .collect();

        Self {
            members,
            stop_timeout_ms: default_stop_timeout_ms(),
            retry_after_ms: None,
        }
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.members.is_empty() {
            return Err(NodeError::Config("council has no members".into()));
        }

        let mut names = HashSet::new();
        let mut endpoints = HashSet::new();
        for m in &self.members {
            if m.name.is_empty() || m.name.contains([';', '\r', '\n']) {
                return Err(NodeError::Config(format!("invalid member name {:?}", m.name)));
            }
            if !names.insert(m.name.as_str()) {
                return Err(NodeError::Config(format!("duplicate member {}", m.name)));
            }
            if m.acceptor_port == m.proposer_port {
                return Err(NodeError::Config(format!("{} uses port {} twice", m.name, m.acceptor_port)));
            }
            for port in [m.acceptor_port, m.proposer_port] {
                if !endpoints.insert((m.host.as_str(), port)) {
                    return Err(NodeError::Config(format!("{}:{} assigned twice", m.host, port)));
                }
            }
        }

        if !self.members.iter().any(|m| m.proposer) {
            return Err(NodeError::Config("council has no proposer".into()));
        }
        Ok(())
    }

    pub fn peers(&self) -> PeerDirectory {
        self.members.iter().map(MemberConfig::identity).collect()
    }

    pub fn member(&self, name: &str) -> Option<&MemberConfig> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), NodeError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, NodeError> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<CouncilConfig>(&data)?;
        Ok(parsed)
    }
}
