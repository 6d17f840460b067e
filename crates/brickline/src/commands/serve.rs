//! Serve command - run the MCP server over stdio.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use brickline_config::{CredentialField, DefaultCredentials};
use brickline_mcp::McpServer;
use brickline_session::{SessionConfig, SessionManager};
use brickline_warehouse::DatabricksClient;
use clap::Args;
use tracing::info;

use super::Context;

/// Arguments for the serve command.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Session inactivity timeout in seconds (overrides [session] ttl_secs)
    #[arg(long)]
    pub session_ttl: Option<u64>,

    /// Request timeout in seconds (overrides [databricks] timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config();
    let config = &loaded.config;
    for path in loaded.loaded_from() {
        info!(path = %path.display(), "loaded config");
    }

    let defaults = DefaultCredentials::resolve(config);
    let missing = defaults.missing(&CredentialField::ALL);
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.env_var()).collect();
        info!(
            missing = %names.join(", "),
            "default credentials incomplete, tools will need a session_id"
        );
    }

    let ttl = Duration::from_secs(args.session_ttl.unwrap_or_else(|| config.session_ttl_secs()));
    let timeout = Duration::from_secs(args.timeout.unwrap_or_else(|| config.request_timeout_secs()));
    let session_config = SessionConfig::new()
        .with_ttl(ttl)
        .with_probe_timeout(Duration::from_secs(config.probe_timeout_secs()));

    let client = Arc::new(DatabricksClient::builder().timeout(timeout).build()?);
    let manager = SessionManager::new(session_config, client.clone(), defaults);
    let server = McpServer::databricks(manager, client.clone(), client);

    info!(
        ttl_secs = ttl.as_secs(),
        timeout_secs = timeout.as_secs(),
        verbose = ctx.verbose,
        "serving MCP on stdio"
    );
    server.serve_stdio().await?;
    info!("stdin closed, shutting down");
    Ok(())
}
