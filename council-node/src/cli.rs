use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "council")]
#[command(about = "Single-decree Paxos council election")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a council and run one election
    Run(RunArgs),
    /// Write the nine-member council config to a file
    GenerateConfig {
        #[arg(short, long, value_name = "FILE")]
        out: PathBuf,
        /// Every member responds immediately instead of round-robin delays
        #[arg(long)]
        immediate: bool,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Council config; the nine-member council on ports 8001/9001 when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Proposer that starts the election
    #[arg(long, default_value = "M1")]
    pub proposer: String,

    /// Value to propose; defaults to the proposer's name
    #[arg(long)]
    pub value: Option<String>,

    /// Ignore configured delay profiles
    #[arg(long)]
    pub immediate: bool,

    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Write the consensus event stream to this file
    #[arg(long, value_name = "PATH")]
    pub audit_log: Option<PathBuf>,
}
