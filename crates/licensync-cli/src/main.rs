//! licensync CLI - Command-line interface for license configuration reconciliation
//!
//! Provides commands for:
//! - Planning the change needed to converge a declared configuration
//! - Applying it (create, update or replace)
//! - Refreshing tracked state against the remote system
//! - Importing existing license configurations
//! - Destroying tracked license configurations

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use licensync_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod state;

use commands::{
    apply::ApplyCommand, destroy::DestroyCommand, import::ImportCommand, plan::PlanCommand,
    refresh::RefreshCommand,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "licensync",
    version,
    about = "Reconcile License Manager license configurations"
)]
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
    /// Show the change needed to converge a declared configuration
    Plan(PlanCommand),
    /// Create, update or replace the license configuration
    Apply(ApplyCommand),
    /// Check tracked state for drift
    Refresh(RefreshCommand),
    /// Start tracking an existing license configuration
    Import(ImportCommand),
    /// Delete the tracked license configuration
    Destroy(DestroyCommand),
}

/// Loads and validates the configuration named on the command line
fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path()),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }

    Ok(config)
}

fn init_tracing(verbose: u8, config: &Config) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    init_tracing(cli.verbose, &config);

    match cli.command {
        Commands::Plan(cmd) => cmd.execute(&config, format).await,
        Commands::Apply(cmd) => cmd.execute(&config, format).await,
        Commands::Refresh(cmd) => cmd.execute(&config, format).await,
        Commands::Import(cmd) => cmd.execute(&config, format).await,
        Commands::Destroy(cmd) => cmd.execute(&config, format).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match run(cli, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            get_formatter(format).error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
