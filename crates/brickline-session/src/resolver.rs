//! Credential resolution: explicit session or process-wide defaults.

use std::sync::Arc;

use brickline_config::{CredentialField, DefaultCredentials};
use brickline_types::{ApiCredentials, Credentials};
use tracing::trace;

use crate::error::{Result, SessionError};
use crate::session::SessionId;
use crate::store::SessionStore;

/// Decides which credentials a call runs with.
///
/// A non-empty session id must name a live session; otherwise the call fails
/// with [`SessionError::InvalidSession`] and never falls back to the
/// defaults. Only a missing or empty session id uses the defaults; an id of
/// whitespace is looked up like any other and fails.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    store: SessionStore,
    defaults: Arc<DefaultCredentials>,
}

impl CredentialResolver {
    /// Create a resolver over `store` with the given defaults.
    pub fn new(store: SessionStore, defaults: DefaultCredentials) -> Self {
        Self {
            store,
            defaults: Arc::new(defaults),
        }
    }

    /// The default credentials consulted when no session is given.
    pub fn defaults(&self) -> &DefaultCredentials {
        &self.defaults
    }

    /// Resolve the full credential triple for a SQL call.
    ///
    /// Looking up a session touches it.
    pub fn resolve(&self, session_id: Option<&str>) -> Result<Credentials> {
        if let Some(id) = given(session_id) {
            return self.lookup(id);
        }

        let missing = self.defaults.missing(&CredentialField::ALL);
        match (
            self.defaults.host(),
            self.defaults.token(),
            self.defaults.http_path(),
        ) {
            (Some(host), Some(token), Some(http_path)) => {
                trace!("using default credentials");
                Ok(Credentials::new(host, token, http_path))
            }
            _ => Err(SessionError::MissingCredentials { missing }),
        }
    }

    /// Resolve host and token for a REST call.
    ///
    /// Same policy as [`resolve`](Self::resolve), except that the default
    /// configuration does not need an HTTP path.
    pub fn resolve_api(&self, session_id: Option<&str>) -> Result<ApiCredentials> {
        if let Some(id) = given(session_id) {
            return self.lookup(id).map(|c| c.api());
        }

        let missing = self
            .defaults
            .missing(&[CredentialField::Host, CredentialField::Token]);
        match (self.defaults.host(), self.defaults.token()) {
            (Some(host), Some(token)) => Ok(ApiCredentials::new(host, token)),
            _ => Err(SessionError::MissingCredentials { missing }),
        }
    }

    fn lookup(&self, raw_id: &str) -> Result<Credentials> {
        let id: SessionId = raw_id
            .parse()
            .map_err(|_| SessionError::InvalidSession(raw_id.to_string()))?;
        let session = self
            .store
            .get(&id)
            .ok_or_else(|| SessionError::InvalidSession(raw_id.to_string()))?;
        trace!(session_id = %id, "using session credentials");
        Ok(session.credentials().clone())
    }
}

fn given(session_id: Option<&str>) -> Option<&str> {
    session_id.filter(|s| !s.is_empty())
}
