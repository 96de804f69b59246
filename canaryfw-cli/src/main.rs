//! ## canaryfw
//! **Synthetic firewall log emitter**
//!
//! Watches inbound TCP SYNs and UDP datagrams with tcpdump and appends a
//! kernel-style firewall record for each probe to the system log, so port
//! scans show up for log viewers and alerting.
//!
//! `canaryfw` alone runs the daemon; `canaryfw replay` renders saved
//! tcpdump output to stdout.

use clap::Parser;
use canaryfw_telemetry::logging::EventLogger;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let cli = Cli::parse();

    match cli.command.unwrap_or_default() {
        Commands::Run(run_args) => commands::run(run_args).await,
        Commands::Replay(replay_args) => commands::replay(replay_args).await,
    }
}
