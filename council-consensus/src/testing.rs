//! Test doubles: a sender that records instead of dialing, and an in-memory
//! council that routes `Outbound` records between state machines directly.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use council_common::{Endpoint, NodeId, NodeIdentity, PeerDirectory};
use council_p2p::MessageSender;

use crate::acceptor::Acceptor;
use crate::proposer::Proposer;
use crate::role::{Outbound, Role};

#[derive(Debug, Default)]
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<(String, String, u16)>>,
}

impl RecordingSender {
    pub(crate) fn sent(&self) -> Vec<(String, String, u16)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) async fn wait_for_count(&self, n: usize) -> Vec<(String, String, u16)> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= n {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} records, got {:?}", self.sent());
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, record: String, host: &str, port: u16) {
        self.sent.lock().unwrap().push((record, host.to_string(), port));
    }
}

/// Council wired together without sockets. Delivery order is whatever the
/// test chooses.
pub(crate) struct InMemoryCouncil {
    pub(crate) peers: PeerDirectory,
    pub(crate) acceptors: HashMap<NodeId, Acceptor>,
    pub(crate) proposers: HashMap<NodeId, Proposer>,
    pub(crate) in_flight: VecDeque<Outbound>,
    /// Every CHOSEN transition, across all rounds: `(proposer, n, value)`.
    pub(crate) chosen_log: Vec<(NodeId, i64, String)>,
}

impl InMemoryCouncil {
    pub(crate) fn new(size: u16, proposers: &[&str]) -> Self {
        let peers: PeerDirectory = (1..=size)
            .map(|i| NodeIdentity::new(format!("M{i}"), "127.0.0.1", 8000 + i, 9000 + i))
            .collect();
        let acceptors = peers
            .iter()
            .map(|m| (m.name().clone(), Acceptor::new(m.name().clone(), peers.clone())))
            .collect();
        let proposers = proposers
            .iter()
            .map(|name| {
                let id = NodeId::from(*name);
                (id.clone(), Proposer::new(id, peers.clone()).unwrap())
            })
            .collect();
        Self {
            peers,
            acceptors,
            proposers,
            in_flight: VecDeque::new(),
            chosen_log: Vec::new(),
        }
    }

    pub(crate) fn start(&mut self, proposer: &str, value: &str) {
        let out = self
            .proposers
            .get_mut(&NodeId::from(proposer))
            .unwrap()
            .start_proposal(value.to_string());
        self.in_flight.extend(out);
    }

    /// Delivers one record; returns `false` when nothing is in flight.
    pub(crate) fn step(&mut self, pick: impl FnOnce(usize) -> usize) -> bool {
        if self.in_flight.is_empty() {
            return false;
        }
        let idx = pick(self.in_flight.len()).min(self.in_flight.len() - 1);
        let Some(out) = self.in_flight.remove(idx) else {
            return false;
        };
        let sender = out.message.participant_id.clone();
        let target = out.target.name().clone();
        let replies = match out.endpoint {
            Endpoint::Acceptor => self
                .acceptors
                .get_mut(&target)
                .map(|a| a.handle(out.message, &sender))
                .unwrap_or_default(),
            Endpoint::Proposer => match self.proposers.get_mut(&target) {
                Some(p) => {
                    let was_chosen = p.state().is_chosen();
                    let replies = p.handle(out.message, &sender);
                    let state = p.state();
                    if !was_chosen && state.is_chosen() {
                        let value = state.chosen_value.clone().unwrap_or_default();
                        self.chosen_log.push((target, state.current_proposal_number, value));
                    }
                    replies
                }
                None => Vec::new(),
            },
        };
        self.in_flight.extend(replies);
        true
    }

    pub(crate) fn run_fifo(&mut self) {
        while self.step(|_| 0) {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::AcceptorState;
    use crate::proposer::ProposerPhase;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap as Map;

    #[test]
    fn test_single_proposer_reaches_chosen() {
        let mut council = InMemoryCouncil::new(3, &["M1"]);
        council.start("M1", "M1");
        council.run_fifo();

        let p = &council.proposers[&NodeId::from("M1")];
        assert_eq!(p.state().phase, ProposerPhase::Chosen);
        assert_eq!(p.state().chosen_value.as_deref(), Some("M1"));
        assert_eq!(p.state().promises_received, 2);
        assert_eq!(council.chosen_log.len(), 1);
        assert!(council
            .acceptors
            .values()
            .any(|a| a.state().accepted_value.as_deref() == Some("M1")));
    }

    #[test]
    fn test_new_proposer_adopts_value_already_accepted() {
        let mut council = InMemoryCouncil::new(3, &["M1"]);
        let held = AcceptorState {
            highest_promised: 5,
            accepted_proposal_number: 5,
            accepted_value: Some("M3".into()),
        };
        for acceptor in council.acceptors.values_mut() {
            *acceptor = Acceptor::with_state(acceptor.identity().clone(), council.peers.clone(), held.clone());
        }

        // the first round is numbered below the existing promise: silence
        council.start("M1", "M1");
        council.run_fifo();
        let p = &council.proposers[&NodeId::from("M1")];
        assert_eq!(p.state().phase, ProposerPhase::Preparing);
        assert_eq!(p.state().promises_received, 0);

        council.start("M1", "M1");
        council.run_fifo();

        let p = &council.proposers[&NodeId::from("M1")];
        assert!(p.state().current_proposal_number > 5);
        assert_eq!(p.state().proposed_value.as_deref(), Some("M3"));
        assert_eq!(p.state().chosen_value.as_deref(), Some("M3"));
        for acceptor in council.acceptors.values() {
            assert_ne!(acceptor.state().accepted_value.as_deref(), Some("M1"));
        }
    }

    #[test]
    fn test_dueling_proposers_never_choose_two_values() {
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut council = InMemoryCouncil::new(5, &["M1", "M2"]);
            council.start("M1", "M1");
            council.start("M2", "M2");

            let mut restarts = 0;
            loop {
                if !council.step(|len| rng.gen_range(0..len)) {
                    break;
                }
                // occasionally a proposer gives up and retries with a new round
                if restarts < 4 && rng.gen_bool(0.05) {
                    let who = if rng.gen_bool(0.5) { "M1" } else { "M2" };
                    council.start(who, who);
                    restarts += 1;
                }
            }

            // a second contest after the first settled, so earlier choices
            // are overwritten in the proposers' state but not in the log
            council.start("M2", "M2");
            council.start("M1", "M1");
            while council.step(|len| rng.gen_range(0..len)) {}

            let values: Vec<&str> = council.chosen_log.iter().map(|(_, _, v)| v.as_str()).collect();
            assert!(
                values.windows(2).all(|w| w[0] == w[1]),
                "seed {seed} chose different values: {:?}",
                council.chosen_log
            );

            for acceptor in council.acceptors.values() {
                let mut by_number: Map<i64, String> = Map::new();
                for (n, v) in &acceptor.snapshot().accepted_log {
                    let prev = by_number.entry(*n).or_insert_with(|| v.clone());
                    assert_eq!(prev, v, "seed {seed}: two values accepted at n={n}");
                }
            }
        }
    }
}
