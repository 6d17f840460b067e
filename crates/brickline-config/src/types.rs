//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [session]
//! ttl_secs = 3600
//! probe_timeout_secs = 60
//!
//! [databricks]
//! host = "adb-123456789.0.azuredatabricks.net"
//! http_path = "/sql/1.0/warehouses/abcdef0123456789"
//! timeout_secs = 120
//! ```

use serde::{Deserialize, Serialize};

/// Default session inactivity timeout (one hour).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Default upper bound on the login connectivity probe.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 60;

/// Default request timeout for warehouse and REST calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BricklineConfig {
    /// Session policy.
    pub session: Option<SessionSection>,

    /// Workspace connection defaults.
    pub databricks: Option<DatabricksSection>,
}

impl BricklineConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections merge field by field, so a project file can override just
    /// the warehouse path while keeping the user-level host.
    pub fn merge(&mut self, other: BricklineConfig) {
        if let Some(over) = other.session {
            match self.session.as_mut() {
                Some(base) => base.merge(over),
                None => self.session = Some(over),
            }
        }

        if let Some(over) = other.databricks {
            match self.databricks.as_mut() {
                Some(base) => base.merge(over),
                None => self.databricks = Some(over),
            }
        }
    }

    /// Effective session TTL in seconds.
    pub fn session_ttl_secs(&self) -> u64 {
        self.session
            .as_ref()
            .and_then(|s| s.ttl_secs)
            .unwrap_or(DEFAULT_SESSION_TTL_SECS)
    }

    /// Effective login probe timeout in seconds.
    pub fn probe_timeout_secs(&self) -> u64 {
        self.session
            .as_ref()
            .and_then(|s| s.probe_timeout_secs)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS)
    }

    /// Effective request timeout in seconds.
    pub fn request_timeout_secs(&self) -> u64 {
        self.databricks
            .as_ref()
            .and_then(|d| d.timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

/// The `[session]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Inactivity timeout applied to every new session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,

    /// Upper bound on the login probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_timeout_secs: Option<u64>,
}

impl SessionSection {
    fn merge(&mut self, other: SessionSection) {
        if other.ttl_secs.is_some() {
            self.ttl_secs = other.ttl_secs;
        }
        if other.probe_timeout_secs.is_some() {
            self.probe_timeout_secs = other.probe_timeout_secs;
        }
    }
}

/// The `[databricks]` section.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabricksSection {
    /// Default workspace host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Default access token (plaintext; prefer `DATABRICKS_TOKEN`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Default SQL warehouse HTTP path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,

    /// Request timeout for warehouse and REST calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl DatabricksSection {
    fn merge(&mut self, other: DatabricksSection) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.http_path.is_some() {
            self.http_path = other.http_path;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Whether a plaintext token is present in the file.
    pub fn has_plaintext_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for DatabricksSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabricksSection")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("http_path", &self.http_path)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BricklineConfig::from_toml("").unwrap();
        assert_eq!(config.session_ttl_secs(), DEFAULT_SESSION_TTL_SECS);
        assert_eq!(config.probe_timeout_secs(), DEFAULT_PROBE_TIMEOUT_SECS);
        assert_eq!(config.request_timeout_secs(), DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_parse_sections() {
        let config = BricklineConfig::from_toml(
            r#"
[session]
ttl_secs = 600

[databricks]
host = "adb-1.azuredatabricks.net"
http_path = "/sql/1.0/warehouses/abc"
timeout_secs = 30
"#,
        )
        .unwrap();

        assert_eq!(config.session_ttl_secs(), 600);
        assert_eq!(config.request_timeout_secs(), 30);
        let db = config.databricks.unwrap();
        assert_eq!(db.host.as_deref(), Some("adb-1.azuredatabricks.net"));
        assert!(!db.has_plaintext_token());
    }

    #[test]
    fn test_merge_is_field_wise() {
        let mut base = BricklineConfig::from_toml(
            r#"
[databricks]
host = "user-host"
http_path = "/sql/1.0/warehouses/user"
"#,
        )
        .unwrap();
        let over = BricklineConfig::from_toml(
            r#"
[databricks]
http_path = "/sql/1.0/warehouses/project"

[session]
ttl_secs = 120
"#,
        )
        .unwrap();

        base.merge(over);

        let db = base.databricks.as_ref().unwrap();
        assert_eq!(db.host.as_deref(), Some("user-host"));
        assert_eq!(db.http_path.as_deref(), Some("/sql/1.0/warehouses/project"));
        assert_eq!(base.session_ttl_secs(), 120);
    }

    #[test]
    fn test_debug_redacts_token() {
        let section = DatabricksSection {
            token: Some("dapi-secret".to_string()),
            ..Default::default()
        };
        assert!(section.has_plaintext_token());
        assert!(!format!("{:?}", section).contains("dapi-secret"));
    }

    #[test]
    fn test_toml_roundtrip_skips_unset_fields() {
        let config = BricklineConfig {
            session: Some(SessionSection {
                ttl_secs: Some(900),
                probe_timeout_secs: None,
            }),
            databricks: None,
        };
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("ttl_secs = 900"));
        assert!(!rendered.contains("probe_timeout_secs"));
        assert_eq!(BricklineConfig::from_toml(&rendered).unwrap(), config);
    }
}
