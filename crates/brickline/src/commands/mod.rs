//! CLI command handlers.

pub mod check;
pub mod config;
pub mod serve;

use std::path::PathBuf;

use brickline_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// User config directory, if one could be determined.
    pub config_dir: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load the layered config, logging any warnings it produced.
    pub fn load_config(&self) -> LoadedConfig {
        let loaded = brickline_config::load_config(None, self.config_dir.as_deref());
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        loaded
    }

    /// Path of the user config file.
    pub fn user_config_path(&self) -> Option<PathBuf> {
        self.config_dir
            .as_deref()
            .map(brickline_config::user_config_file)
    }
}
