//! Default workspace credentials used when a call carries no session.
//!
//! Resolution order per field:
//! 1. Environment variable (`DATABRICKS_HOST`, `DATABRICKS_TOKEN`, `DATABRICKS_HTTP_PATH`)
//! 2. `[databricks]` section of the config file
//!
//! Empty values count as missing. A `.env` file in the working directory is
//! loaded into the environment by [`load_dotenv`] before resolution.

use std::path::PathBuf;

use crate::BricklineConfig;

/// Environment variable holding the default workspace host.
pub const HOST_ENV: &str = "DATABRICKS_HOST";

/// Environment variable holding the default access token.
pub const TOKEN_ENV: &str = "DATABRICKS_TOKEN";

/// Environment variable holding the default SQL warehouse HTTP path.
pub const HTTP_PATH_ENV: &str = "DATABRICKS_HTTP_PATH";

/// One of the three credential fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    /// Workspace host.
    Host,
    /// Access token.
    Token,
    /// Warehouse HTTP path.
    HttpPath,
}

impl CredentialField {
    /// All fields, in display order.
    pub const ALL: [CredentialField; 3] = [Self::Host, Self::Token, Self::HttpPath];

    /// Environment variable consulted for this field.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Host => HOST_ENV,
            Self::Token => TOKEN_ENV,
            Self::HttpPath => HTTP_PATH_ENV,
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.env_var())
    }
}

/// Where a default value was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Environment variable (possibly populated from `.env`).
    EnvVar(&'static str),
    /// Config file (plaintext for the token, not recommended).
    ConfigFile,
    /// Supplied programmatically.
    Explicit,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::EnvVar(var) => write!(f, "env var {}", var),
            CredentialSource::ConfigFile => write!(f, "config file"),
            CredentialSource::Explicit => write!(f, "explicit"),
        }
    }
}

/// A resolved value with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    value: String,
    source: CredentialSource,
}

/// Process-wide default credentials.
///
/// Every field is optional; callers decide which subset they need and
/// report the rest via [`DefaultCredentials::missing`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DefaultCredentials {
    host: Option<Resolved>,
    token: Option<Resolved>,
    http_path: Option<Resolved>,
}

impl DefaultCredentials {
    /// No defaults at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from explicit values. Empty strings are treated as missing.
    pub fn from_values(
        host: Option<&str>,
        token: Option<&str>,
        http_path: Option<&str>,
    ) -> Self {
        let explicit = |v: Option<&str>| {
            v.filter(|s| !s.is_empty()).map(|s| Resolved {
                value: s.to_string(),
                source: CredentialSource::Explicit,
            })
        };
        Self {
            host: explicit(host),
            token: explicit(token),
            http_path: explicit(http_path),
        }
    }

    /// Resolve from the process environment, falling back to `config`.
    pub fn resolve(config: &BricklineConfig) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve using a custom environment lookup.
    pub fn resolve_with<F>(config: &BricklineConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = config.databricks.clone().unwrap_or_default();
        let pick = |field: CredentialField, file_value: Option<String>| {
            let env_var = field.env_var();
            if let Some(value) = lookup(env_var).filter(|v| !v.is_empty()) {
                return Some(Resolved {
                    value,
                    source: CredentialSource::EnvVar(env_var),
                });
            }
            file_value.filter(|v| !v.is_empty()).map(|value| Resolved {
                value,
                source: CredentialSource::ConfigFile,
            })
        };

        Self {
            host: pick(CredentialField::Host, section.host),
            token: pick(CredentialField::Token, section.token),
            http_path: pick(CredentialField::HttpPath, section.http_path),
        }
    }

    /// Default host, if any.
    pub fn host(&self) -> Option<&str> {
        self.host.as_ref().map(|r| r.value.as_str())
    }

    /// Default token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|r| r.value.as_str())
    }

    /// Default HTTP path, if any.
    pub fn http_path(&self) -> Option<&str> {
        self.http_path.as_ref().map(|r| r.value.as_str())
    }

    /// Where a field came from, if it is set.
    pub fn source(&self, field: CredentialField) -> Option<&CredentialSource> {
        self.slot(field).as_ref().map(|r| &r.source)
    }

    /// Fields from `required` that have no value.
    pub fn missing(&self, required: &[CredentialField]) -> Vec<CredentialField> {
        required
            .iter()
            .copied()
            .filter(|f| self.slot(*f).is_none())
            .collect()
    }

    fn slot(&self, field: CredentialField) -> &Option<Resolved> {
        match field {
            CredentialField::Host => &self.host,
            CredentialField::Token => &self.token,
            CredentialField::HttpPath => &self.http_path,
        }
    }
}

impl std::fmt::Debug for DefaultCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultCredentials")
            .field("host", &self.host())
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("http_path", &self.http_path())
            .finish()
    }
}

/// Load a `.env` file from the working directory (or its parents) into the
/// process environment. Existing variables are not overwritten.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded .env file");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load .env file");
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
