//! Check command - show what `serve` would run with.

use anyhow::Result;
use brickline_config::{CredentialField, DefaultCredentials};

use super::Context;

/// Run the check command.
pub async fn run(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config();
    let config = &loaded.config;

    println!("# Brickline Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in sources {
            println!("  {}", source.display());
        }
        println!();
    }

    println!("Session:");
    println!("  ttl: {}s", config.session_ttl_secs());
    println!("  probe timeout: {}s", config.probe_timeout_secs());
    println!();
    println!("Databricks:");
    println!("  request timeout: {}s", config.request_timeout_secs());
    println!();

    let defaults = DefaultCredentials::resolve(config);
    println!("Default credentials:");
    for field in CredentialField::ALL {
        println!("  {}: {}", field, describe(&defaults, field));
    }

    let missing = defaults.missing(&CredentialField::ALL);
    if !missing.is_empty() {
        println!();
        println!("Tools need a session_id from `login` until these are set.");
    }

    for warning in &loaded.warnings {
        println!();
        println!("warning: {}", warning);
    }

    Ok(())
}

fn describe(defaults: &DefaultCredentials, field: CredentialField) -> String {
    let value = match field {
        CredentialField::Host => defaults.host(),
        CredentialField::Token => defaults.token().map(|_| "[redacted]"),
        CredentialField::HttpPath => defaults.http_path(),
    };
    match (value, defaults.source(field)) {
        (Some(value), Some(source)) => format!("{} ({})", value, source),
        (Some(value), None) => value.to_string(),
        (None, _) => "not set".to_string(),
    }
}
