//! council.rs
//!
//! Builds every member of a configured council on loopback and drives an
//! election through it.

use std::fmt::Write as _;
use std::time::Duration;

use council_consensus::{new_participant, ConsensusError, Member, ProposerState};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::CouncilConfig;
use crate::error::NodeError;

pub struct Council {
    config: CouncilConfig,
    members: Vec<Member>,
}

impl Council {
    /// Starts every configured member. If any member fails to bind, the ones
    /// already running are stopped before the error is returned.
    pub async fn start(config: CouncilConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let peers = config.peers();

        let mut members = Vec::with_capacity(config.members.len());
        for member in &config.members {
            let started = new_participant(
                member.identity(),
                peers.clone(),
                member.participant_config(&config),
                member.proposer,
            )
            .await;

            match started {
                Ok(m) => members.push(m),
                Err(e) => {
                    warn!(member = %member.name, error = %e, "member failed to start");
                    for m in members {
                        m.stop().await;
                    }
                    return Err(e.into());
                }
            }
        }

        info!(members = members.len(), "council started");
        Ok(Self { config, members })
    }

    pub fn config(&self) -> &CouncilConfig {
        &self.config
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn proposers(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_proposer())
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.identity().name().as_str() == name)
    }

    /// Asks the named proposer to start a round for `value`.
    pub fn kickoff(&self, name: &str, value: &str) -> Result<(), NodeError> {
        let member = self
            .member(name)
            .ok_or_else(|| NodeError::Config(format!("no member named {name}")))?;
        member.start_proposal(value)?;
        info!(proposer = name, value, "election started");
        Ok(())
    }

    /// Waits until some proposer reports CHOSEN and returns its value, or
    /// `None` when nothing is chosen within `timeout`.
    pub async fn await_result(&self, timeout: Duration) -> Option<String> {
        let mut waiters = JoinSet::new();
        for proposer in self.proposers().filter_map(Member::proposer) {
            let mut status = proposer.subscribe();
            waiters.spawn(async move {
                status
                    .wait_for(ProposerState::is_chosen)
                    .await
                    .map_err(|_| ConsensusError::Stopped)
                    .map(|state| state.chosen_value.clone())
            });
        }

        let first = tokio::time::timeout(timeout, async {
            while let Some(joined) = waiters.join_next().await {
                if let Ok(Ok(Some(value))) = joined {
                    return Some(value);
                }
            }
            None
        })
        .await;

        waiters.abort_all();
        first.ok().flatten()
    }

    /// Topology summary: one line per member with ports, delay and roles.
    pub fn describe(&self) -> String {
        let mut out = format!("council of {} members\n", self.config.members.len());
        for m in &self.config.members {
            let peers: Vec<&str> = self
                .config
                .members
                .iter()
                .filter(|p| p.name != m.name)
                .map(|p| p.name.as_str())
                .collect();
            let roles = if m.proposer { "acceptor+proposer" } else { "acceptor" };
            let _ = writeln!(
                out,
                "  {} {} acceptor={} proposer={} delay={} roles={} peers=[{}]",
                m.name,
                m.host,
                m.acceptor_port,
                m.proposer_port,
                m.delay,
                roles,
                peers.join(",")
            );
        }
        out
    }

    pub async fn shutdown(self) {
        for member in self.members {
            member.stop().await;
        }
        info!("council stopped");
    }
}
