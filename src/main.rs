use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use emotitask::config::{self, AppConfig};
use emotitask::{cli, server};

#[derive(Parser)]
#[command(
    name = "emotitask",
    version,
    about = "Emotionally intelligent task management API"
)]
struct Cli {
    /// Config file (default: ~/.emotitask/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve,
    /// Check configuration and connectivity to the hosted services
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal; the environment may already be set.
    dotenv::dotenv().ok();

    let config = AppConfig::load_from(
        cli.config
            .clone()
            .unwrap_or_else(config::default_config_path),
    )?;

    // Log to stderr so `doctor` output on stdout stays clean.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config).await?;
        }
    }

    Ok(())
}
