//! CLI command definitions and dispatch.

mod analyze;
mod config;
mod push;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use layerscan_core::{ScanConfig, ScanError};

/// layerscan - analyze container image layers with a Clair-compatible scanner.
#[derive(Parser)]
#[command(name = "layerscan", version, about)]
pub struct Cli {
    /// Configuration file (defaults to ~/.layerscan/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Analysis service endpoint, e.g. "http://clair:6060"
    #[arg(long, global = true)]
    pub oracle: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Push an image's layers to the analysis service
    Push(push::PushArgs),
    /// Push an image and report the vulnerabilities found in its layers
    Analyze(analyze::AnalyzeArgs),
    /// Print the effective configuration
    Config(config::ConfigArgs),
}

/// Load configuration and apply global flag overrides.
pub fn load_config(cli: &Cli) -> Result<ScanConfig, ScanError> {
    let mut config = ScanConfig::load(cli.config.as_deref())?;
    if let Some(ref oracle) = cli.oracle {
        config.oracle.set_endpoint(oracle)?;
    }
    Ok(config)
}

/// Process exit code for an error returned by [`dispatch`].
///
/// Fatal scan errors exit with 2, everything else with 1.
pub fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<ScanError>() {
        Some(e) if e.is_fatal() => 2,
        _ => 1,
    }
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli, config: ScanConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Push(args) => push::execute(args, config).await,
        Command::Analyze(args) => analyze::execute(args, config).await,
        Command::Config(args) => config::execute(args, config).await,
    }
}
