//! Configuration system for brickline.
//!
//! Provides TOML-based configuration with:
//! - Session policy (`[session]`: inactivity TTL, login probe timeout)
//! - Workspace defaults (`[databricks]`: host, http_path, request timeout)
//! - Config file layering (XDG user config + project-local overrides)
//! - Default credential resolution (environment → config file), used when a
//!   tool call carries no session id

pub mod defaults;
pub mod discovery;
pub mod error;
pub mod types;

pub use defaults::{
    CredentialField, CredentialSource, DefaultCredentials, HOST_ENV, HTTP_PATH_ENV, TOKEN_ENV,
    load_dotenv,
};
pub use discovery::{
    LoadedConfig, config_dir, load_config, read_config_file, user_config_file, write_config_file,
};
pub use error::{ConfigError, Result};
pub use types::{BricklineConfig, DatabricksSection, SessionSection};
