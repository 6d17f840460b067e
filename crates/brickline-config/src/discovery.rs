//! Locating and layering brickline config files.
//!
//! Two layers, lowest precedence first:
//! 1. `config.toml` in the user config directory (see [`config_dir`])
//! 2. `brickline.toml` in the project directory
//!
//! Environment credentials sit above both and are applied by
//! [`crate::DefaultCredentials`].

use std::path::{Path, PathBuf};

use crate::{BricklineConfig, ConfigError, Result};

const USER_CONFIG_FILE: &str = "config.toml";
const PROJECT_CONFIG_FILE: &str = "brickline.toml";
const CONFIG_DIR_ENV: &str = "BRICKLINE_CONFIG_DIR";

/// The merged configuration plus what went into it.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: BricklineConfig,
    /// Human-readable problems found while loading (bad layers, plaintext tokens).
    pub warnings: Vec<String>,
    loaded: Vec<PathBuf>,
}

impl LoadedConfig {
    /// Files that were read and merged, lowest precedence first.
    pub fn loaded_from(&self) -> &[PathBuf] {
        &self.loaded
    }

    fn apply(&mut self, path: PathBuf) {
        if !path.is_file() {
            return;
        }
        match read_config_file(&path) {
            Ok(layer) => {
                tracing::debug!(path = %path.display(), "loaded config layer");
                self.config.merge(layer);
                self.loaded.push(path);
            }
            // A broken layer is skipped so the server can still start on env credentials.
            Err(e) => self.warnings.push(format!("Failed to load {}: {}", path.display(), e)),
        }
    }
}

/// The user config directory.
///
/// `BRICKLINE_CONFIG_DIR` when set and non-empty, else `<platform config dir>/brickline`.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("brickline")),
    }
}

/// Path of the user config file inside `config_dir`.
pub fn user_config_file(config_dir: &Path) -> PathBuf {
    config_dir.join(USER_CONFIG_FILE)
}

/// Load and merge the config layers.
///
/// `config_dir` of `None` skips the user layer; `project_dir` of `None`
/// looks for `brickline.toml` in the working directory.
pub fn load_config(project_dir: Option<&Path>, config_dir: Option<&Path>) -> LoadedConfig {
    let mut loaded = LoadedConfig::default();

    if let Some(dir) = config_dir {
        loaded.apply(user_config_file(dir));
    }
    loaded.apply(project_dir.unwrap_or(Path::new(".")).join(PROJECT_CONFIG_FILE));

    if let Some(db) = &loaded.config.databricks
        && db.has_plaintext_token()
    {
        loaded.warnings.push(
            "[databricks] contains a plaintext token. \
             Consider setting DATABRICKS_TOKEN in the environment or a .env file instead."
                .to_string(),
        );
    }
    loaded
}

/// Read and parse one config file.
pub fn read_config_file(path: &Path) -> Result<BricklineConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    BricklineConfig::from_toml(&contents)
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_config_file(path: &Path, contents: &str) -> Result<()> {
    let write_err = |source| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, contents).map_err(write_err)
}
