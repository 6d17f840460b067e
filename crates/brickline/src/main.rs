//! Brickline - MCP server for Databricks
//!
//! Main entry point for the brickline CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

use commands::{check, config, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Brickline - MCP server for Databricks
#[derive(Parser)]
#[command(name = "brickline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding config.toml and logs/
    #[arg(long, global = true, env = "BRICKLINE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve(serve::ServeArgs),

    /// Show resolved configuration and default credentials
    Check,

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli.config_dir.or_else(brickline_config::config_dir);
    let _guard = init_tracing(cli.verbose, config_dir.as_deref());

    brickline_config::load_dotenv();

    let ctx = commands::Context {
        config_dir,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Check => check::run(&ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console logging goes to stderr because stdout carries the MCP protocol.
/// A daily JSON log is written under `<config dir>/logs` when that directory
/// can be created.
fn init_tracing(verbose: bool, config_dir: Option<&std::path::Path>) -> Option<WorkerGuard> {
    let console_filter = if verbose {
        "brickline=debug,brickline_mcp=debug,brickline_session=debug,brickline_warehouse=debug,brickline_config=debug,info"
    } else {
        "brickline=info,brickline_mcp=info,brickline_session=info,brickline_warehouse=info,warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_filter));

    let log_dir = config_dir
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("brickline")
        .filename_suffix("log")
        .build(&log_dir)
        .ok();

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(
                    "brickline=trace,brickline_mcp=debug,brickline_session=trace,brickline_warehouse=trace,brickline_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    guard
}
