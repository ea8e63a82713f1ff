mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use launchpad_core::{LaunchpadConfig, logging};

use crate::cli::Cli;

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn run(cli: Cli) -> Result<()> {
    let config = LaunchpadConfig::load()?;
    info!(network = %config.network.label(), rpc = %config.soroban_rpc_url, "configuration loaded");

    let ctx = commands::Context::build(config, cli.source.as_deref(), &cli.command)?;
    commands::execute(&ctx, cli.command, cli.json).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging is best effort; the commands still work without a log file.
    let _log_guard = match logging::init_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {e:#}");
            None
        }
    };
    info!("Starting launchpad v{VERSION}");

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
