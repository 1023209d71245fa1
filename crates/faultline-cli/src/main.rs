//! Faultline CLI - Command-line interface for Faultline
//!
//! Provides commands for:
//! - Viewing, editing and validating configuration
//! - Sending a payload file to the collector
//! - Capturing a thread snapshot of the running process

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use faultline_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config::ConfigCommand, send::SendCommand, threads::ThreadsCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "faultline", version, about = "Crash and error telemetry tooling")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Deliver a JSON payload file to the collector
    Send(SendCommand),
    /// Capture and print a thread snapshot of this process
    Threads(ThreadsCommand),
}

/// Filter directive: `-v` flags win over the configured level
fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let configured_level = Config::load_or_default(&config_path).logging.level;

    let filter = log_filter(cli.verbose, &configured_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Config(cmd) => cmd.execute(format, &config_path).await,
        Commands::Send(cmd) => cmd.execute(format, &config_path).await,
        Commands::Threads(cmd) => cmd.execute(format, &config_path).await,
    }
}
