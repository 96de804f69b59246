use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

use canaryfw_config::CanaryConfig;
use canaryfw_emitter::WriterSink;
use canaryfw_engine::{run_daemon, run_replay};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "canaryfw", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture probes and append firewall records to the kernel log (default)
    Run(RunArgs),
    /// Render records for saved tcpdump output to stdout
    Replay(ReplayArgs),
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run(RunArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to config/canaryfw.yaml when present
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// tcpdump output to read; stdin when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Host address probes must target
    #[arg(long)]
    pub host_ip: Option<Ipv4Addr>,
    /// Interface name written into records
    #[arg(long)]
    pub interface: Option<String>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<CanaryConfig, canaryfw_config::ConfigError> {
    match path {
        Some(path) => CanaryConfig::load_from_path(path),
        None => CanaryConfig::load(),
    }
}

pub async fn run(args: RunArgs) -> CliResult {
    let config = load_config(args.config.as_ref())?;
    info!("Starting canaryfw");
    run_daemon(config).await?;
    Ok(())
}

pub async fn replay(args: ReplayArgs) -> CliResult {
    let mut config = load_config(args.config.as_ref())?;
    if args.host_ip.is_some() {
        config.host.address = args.host_ip;
    }
    if args.interface.is_some() {
        config.host.interface = args.interface;
    }

    let input: Box<dyn AsyncBufRead + Unpin + Send> = match &args.input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };
    run_replay(&config, input, WriterSink::new(std::io::stdout())).await?;
    Ok(())
}
