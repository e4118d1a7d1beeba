use std::time::Duration;

use clap::Parser;
use council_common::DelayProfile;
use council_node::cli::{Cli, Command, RunArgs};
use council_node::logging::init_tracing;
use council_node::{Council, CouncilConfig, NodeError};
use tracing::{error, info};

const ACCEPTOR_BASE_PORT: u16 = 8001;
const PROPOSER_BASE_PORT: u16 = 9001;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateConfig { out, immediate } => {
            let profiles: &[DelayProfile] = if immediate { &[] } else { &DelayProfile::ALL };
            let config = CouncilConfig::nine_member(ACCEPTOR_BASE_PORT, PROPOSER_BASE_PORT, profiles);
            config.save_to_file(&out)?;
            println!("wrote {}", out.display());
            Ok(())
        }
        Command::Run(args) => {
            let _guard = init_tracing(args.audit_log.as_deref());
            if let Err(e) = run(args).await {
                error!("election failed: {}", e);
                return Err(e.into());
            }
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> Result<(), NodeError> {
    let mut config = match &args.config {
        Some(path) => CouncilConfig::load_from_file(path)?,
        None => CouncilConfig::nine_member(ACCEPTOR_BASE_PORT, PROPOSER_BASE_PORT, &DelayProfile::ALL),
    };
    if args.immediate {
        config.members.iter_mut().for_each(|m| m.delay = DelayProfile::Immediate);
    }

    let council = Council::start(config).await?;
    info!("{}", council.describe());

    let value = args.value.clone().unwrap_or_else(|| args.proposer.clone());
    if let Err(e) = council.kickoff(&args.proposer, &value) {
        council.shutdown().await;
        return Err(e);
    }

    let result = council.await_result(Duration::from_millis(args.timeout_ms)).await;
    match &result {
        Some(chosen) => {
            info!(value = %chosen, "consensus reached");
            println!("chosen: {chosen}");
        }
        None => println!("no value chosen within {}ms", args.timeout_ms),
    }

    for member in council.members() {
        let state = serde_json::to_string(&member.acceptor().snapshot().state)?;
        info!(
            member = %member.identity().name(),
            state = %state,
            "final acceptor state"
        );
    }

    council.shutdown().await;
    Ok(())
}
