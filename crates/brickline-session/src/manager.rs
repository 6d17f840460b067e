//! Session lifecycle: login, logout, status.

use std::sync::Arc;
use std::time::Duration;

use brickline_config::DefaultCredentials;
use brickline_types::{CollaboratorError, Credentials, SqlWarehouse};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::resolver::CredentialResolver;
use crate::session::{Session, SessionId};
use crate::store::SessionStore;

/// What a successful login hands back to the caller.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Identifier to pass on subsequent calls.
    pub session_id: SessionId,
    /// Host the session is bound to.
    pub host: String,
    /// Inactivity timeout of the new session.
    pub expiry: Duration,
}

/// Snapshot of a live session for display.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session identifier.
    pub id: SessionId,
    /// Host the session is bound to.
    pub host: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last used (this lookup included).
    pub last_used: DateTime<Utc>,
    /// Time left before the session expires.
    pub remaining: Duration,
    /// Inactivity timeout.
    pub expiry: Duration,
}

impl SessionInfo {
    fn from_session(session: &Session) -> Self {
        Self {
            id: session.id(),
            host: session.host().to_string(),
            created_at: session.created_at(),
            last_used: session.last_used(),
            remaining: session.remaining(),
            expiry: session.expiry(),
        }
    }

    /// Whole minutes left before expiry.
    pub fn remaining_minutes(&self) -> u64 {
        self.remaining.as_secs() / 60
    }
}

/// Externally invoked session operations.
///
/// Owns the [`SessionStore`] and hands out a [`CredentialResolver`] over the
/// same store, so sessions created by `login` are visible to every tool.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    resolver: CredentialResolver,
    warehouse: Arc<dyn SqlWarehouse>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a manager with an empty store.
    pub fn new(
        config: SessionConfig,
        warehouse: Arc<dyn SqlWarehouse>,
        defaults: DefaultCredentials,
    ) -> Self {
        let store = SessionStore::new(config.ttl);
        let resolver = CredentialResolver::new(store.clone(), defaults);
        Self {
            store,
            resolver,
            warehouse,
            config,
        }
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Resolver sharing this manager's store.
    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Validate credentials against the warehouse and open a session.
    ///
    /// The probe runs before anything is registered, so a failed login never
    /// leaves a session behind.
    pub async fn login(&self, host: &str, token: &str, http_path: &str) -> Result<LoginOutcome> {
        let credentials = Credentials::new(host.trim(), token.trim(), http_path.trim());
        if let Some(field) = blank_field(&credentials) {
            return Err(SessionError::Auth(CollaboratorError::InvalidRequest(
                format!("{} must not be empty", field),
            )));
        }

        debug!(host = %credentials.host, "validating credentials");
        let probe = self.warehouse.validate(&credentials);
        match tokio::time::timeout(self.config.probe_timeout, probe).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(host = %credentials.host, error = %e, "login failed");
                return Err(SessionError::Auth(e));
            }
            Err(_) => {
                warn!(host = %credentials.host, "login probe timed out");
                return Err(SessionError::Auth(CollaboratorError::Transport(format!(
                    "connection probe timed out after {}s",
                    self.config.probe_timeout.as_secs()
                ))));
            }
        }

        let session = self.store.create(credentials);
        info!(
            session_id = %session.id(),
            host = %session.host(),
            "session created"
        );

        Ok(LoginOutcome {
            session_id: session.id(),
            host: session.host().to_string(),
            expiry: session.expiry(),
        })
    }

    /// Destroy a session. Returns whether there was one to destroy.
    pub fn logout(&self, session_id: &str) -> bool {
        let Ok(id) = session_id.parse::<SessionId>() else {
            return false;
        };
        let removed = self.store.delete(&id);
        if removed {
            info!(session_id = %id, "session destroyed");
        }
        removed
    }

    /// Report on a live session.
    ///
    /// This is a regular lookup: it refreshes the session and evicts it if
    /// it has already expired.
    pub fn session_status(&self, session_id: &str) -> Result<SessionInfo> {
        let session = session_id
            .parse::<SessionId>()
            .ok()
            .and_then(|id| self.store.get(&id))
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        Ok(SessionInfo::from_session(&session))
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

fn blank_field(credentials: &Credentials) -> Option<&'static str> {
    if credentials.host.is_empty() {
        Some("host")
    } else if credentials.token.is_empty() {
        Some("token")
    } else if credentials.http_path.is_empty() {
        Some("http_path")
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use brickline_types::{CollaboratorResult, QueryResult, TableInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Warehouse fake that accepts one token and counts probes.
    #[derive(Default)]
    struct FakeWarehouse {
        probes: AtomicUsize,
        probe_delay: Option<Duration>,
    }

    #[async_trait]
    impl SqlWarehouse for FakeWarehouse {
        async fn validate(&self, credentials: &Credentials) -> CollaboratorResult<()> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.probe_delay {
                tokio::time::sleep(delay).await;
            }
            if credentials.token == "good" {
                Ok(())
            } else {
                Err(CollaboratorError::Unauthorized("invalid access token".into()))
            }
        }

        async fn execute(&self, _: &Credentials, _: &str) -> CollaboratorResult<QueryResult> {
            Ok(QueryResult::default())
        }

        async fn list_tables(&self, _: &Credentials) -> CollaboratorResult<Vec<TableInfo>> {
            Ok(Vec::new())
        }
    }

    fn manager_with(config: SessionConfig, warehouse: FakeWarehouse) -> SessionManager {
        SessionManager::new(config, Arc::new(warehouse), DefaultCredentials::empty())
    }

    fn manager() -> SessionManager {
        manager_with(SessionConfig::default(), FakeWarehouse::default())
    }

    #[tokio::test]
    async fn test_login_status_logout_scenario() {
        let manager = manager();

        let outcome = manager.login("h", "good", "p").await.unwrap();
        assert_eq!(outcome.host, "h");
        assert_eq!(outcome.expiry, Duration::from_secs(3600));

        let id = outcome.session_id.to_string();
        let info = manager.session_status(&id).unwrap();
        assert_eq!(info.id, outcome.session_id);
        assert_eq!(info.host, "h");
        assert!(info.remaining > Duration::from_secs(3590));
        assert!(info.remaining_minutes() >= 59);

        assert!(manager.logout(&id));
        assert!(matches!(
            manager.session_status(&id),
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_login_registers_nothing() {
        let manager = manager();

        let err = manager.login("h", "bad", "p").await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(CollaboratorError::Unauthorized(_))));
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected_without_probe() {
        let warehouse = Arc::new(FakeWarehouse::default());
        let manager = SessionManager::new(
            SessionConfig::default(),
            warehouse.clone(),
            DefaultCredentials::empty(),
        );

        let err = manager.login("h", "good", "  ").await.unwrap_err();
        assert!(err.to_string().contains("http_path must not be empty"));
        assert_eq!(warehouse.probes.load(Ordering::SeqCst), 0);
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn test_probe_timeout_is_auth_error() {
        let manager = manager_with(
            SessionConfig::new().with_probe_timeout(Duration::from_millis(20)),
            FakeWarehouse {
                probe_delay: Some(Duration::from_millis(200)),
                ..Default::default()
            },
        );

        let err = manager.login("h", "good", "p").await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(CollaboratorError::Transport(_))));
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let manager = manager();
        let outcome = manager.login("h", "good", "p").await.unwrap();
        let id = outcome.session_id.to_string();

        assert!(manager.logout(&id));
        assert!(!manager.logout(&id));
        assert!(!manager.logout(&SessionId::new().to_string()));
        assert!(!manager.logout("not-a-session"));
    }

    #[tokio::test]
    async fn test_status_of_expired_session_is_not_found() {
        let manager = manager_with(
            SessionConfig::new().with_ttl(Duration::from_millis(20)),
            FakeWarehouse::default(),
        );
        let outcome = manager.login("h", "good", "p").await.unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        let id = outcome.session_id.to_string();
        assert!(matches!(
            manager.session_status(&id),
            Err(SessionError::NotFound(_))
        ));
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn test_resolver_sees_logged_in_sessions() {
        let manager = manager();
        let outcome = manager.login(" h ", "good", "p").await.unwrap();
        let id = outcome.session_id.to_string();

        let creds = manager.resolver().resolve(Some(&id)).unwrap();
        assert_eq!(creds, Credentials::new("h", "good", "p"));

        manager.logout(&id);
        assert!(matches!(
            manager.resolver().resolve(Some(&id)),
            Err(SessionError::InvalidSession(_))
        ));
    }
}
