use std::time::Duration;

use council_common::DelayProfile;
use council_node::{Council, CouncilConfig, MemberConfig, NodeError};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn small_council(size: usize, proposers: &[&str]) -> CouncilConfig {
    let members = (1..=size)
        .map(|i| {
            let name = format!("M{i}");
            MemberConfig {
                proposer: proposers.contains(&name.as_str()),
                name,
                host: "127.0.0.1".to_string(),
                acceptor_port: free_port(),
                proposer_port: free_port(),
                delay: DelayProfile::Immediate,
            }
        })
        .collect();
    CouncilConfig {
        members,
        stop_timeout_ms: 2000,
        retry_after_ms: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_council_elects_proposed_value() {
    let council = Council::start(small_council(3, &["M1"])).await.unwrap();
    assert_eq!(council.proposers().count(), 1);

    council.kickoff("M1", "M1").unwrap();
    let chosen = council.await_result(Duration::from_secs(5)).await;
    assert_eq!(chosen.as_deref(), Some("M1"));

    council.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_council_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("council.json");
    let mut config = small_council(5, &["M1", "M2"]);
    config.members[4].delay = DelayProfile::NoResponse;
    config.save_to_file(&path).unwrap();

    let council = Council::start(CouncilConfig::load_from_file(&path).unwrap()).await.unwrap();
    let summary = council.describe();
    assert!(summary.contains("M5"));
    assert!(summary.contains("NO_RESPONSE"));

    council.kickoff("M2", "M2").unwrap();
    let chosen = council.await_result(Duration::from_secs(5)).await;
    assert_eq!(chosen.as_deref(), Some("M2"));

    council.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_result_without_kickoff() {
    let council = Council::start(small_council(3, &["M1"])).await.unwrap();
    assert_eq!(council.await_result(Duration::from_millis(200)).await, None);
    council.shutdown().await;
}

#[tokio::test]
async fn test_kickoff_rejects_unknown_and_non_proposers() {
    let council = Council::start(small_council(3, &["M1"])).await.unwrap();

    assert!(matches!(council.kickoff("M7", "x"), Err(NodeError::Config(_))));
    assert!(matches!(council.kickoff("M2", "x"), Err(NodeError::Consensus(_))));
    assert!(matches!(council.kickoff("M1", "bad;value"), Err(NodeError::Consensus(_))));

    council.shutdown().await;
}

#[tokio::test]
async fn test_start_fails_when_a_port_is_taken() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = small_council(3, &["M1"]);
    config.members[2].acceptor_port = taken.local_addr().unwrap().port();

    let err = Council::start(config.clone()).await.err().unwrap();
    assert!(matches!(err, NodeError::Consensus(_)));

    // the members started before the failure released their ports
    drop(taken);
    std::net::TcpListener::bind(("127.0.0.1", config.members[0].acceptor_port)).unwrap();
}

#[tokio::test]
async fn test_start_rejects_invalid_config() {
    let mut config = small_council(2, &[]);
    assert!(matches!(Council::start(config.clone()).await.err(), Some(NodeError::Config(_))));

    config.members[0].proposer = true;
    config.members[1].name = "M1".into();
    assert!(matches!(Council::start(config).await.err(), Some(NodeError::Config(_))));
}
