//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show configuration file path
    Path,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./brickline.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Path => cmd_path(ctx),
        ConfigCommand::Init { local } => cmd_init(ctx, local),
    }
}

fn cmd_path(ctx: &Context) -> Result<()> {
    match ctx.user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => eprintln!("Could not determine config directory"),
    }
    Ok(())
}

const TEMPLATE: &str = r#"# Brickline Configuration
#
# Credentials are best supplied through DATABRICKS_HOST, DATABRICKS_TOKEN
# and DATABRICKS_HTTP_PATH (or a .env file); values here are fallbacks.

[session]
# Inactivity timeout for sessions created by `login`.
ttl_secs = 3600
# Upper bound on the connectivity check run at login.
probe_timeout_secs = 60

[databricks]
# host = "adb-123456789.0.azuredatabricks.net"
# http_path = "/sql/1.0/warehouses/abcdef0123456789"
timeout_secs = 120
"#;

fn cmd_init(ctx: &Context, local: bool) -> Result<()> {
    let path = if local {
        PathBuf::from("brickline.toml")
    } else {
        ctx.user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    brickline_config::write_config_file(&path, TEMPLATE)?;
    println!("Created {}", path.display());
    Ok(())
}
