//! The session entity.

use std::time::Duration;

use brickline_types::Credentials;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque session identifier handed to callers in lieu of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random (v4, 122 random bits) session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A server-side record binding an identifier to connection credentials.
///
/// Credentials and timestamps other than `last_used` are fixed at creation.
/// A session is live while `now - last_used <= expiry`.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    credentials: Credentials,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
    expiry: Duration,
}

impl Session {
    /// Create a session that is live for `expiry` of inactivity.
    pub fn new(credentials: Credentials, expiry: Duration) -> Self {
        Self::with_id(SessionId::new(), credentials, expiry)
    }

    pub(crate) fn with_id(id: SessionId, credentials: Credentials, expiry: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            credentials,
            created_at: now,
            last_used: now,
            expiry,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Workspace host.
    pub fn host(&self) -> &str {
        &self.credentials.host
    }

    /// Credentials captured at login.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the session was last successfully looked up.
    pub fn last_used(&self) -> DateTime<Utc> {
        self.last_used
    }

    /// Inactivity timeout.
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Record a use. `last_used` never moves backwards, even if the wall
    /// clock does.
    pub fn touch(&mut self) {
        self.last_used = self.last_used.max(Utc::now());
    }

    /// Time since the last use.
    pub fn idle(&self) -> Duration {
        (Utc::now() - self.last_used)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the inactivity timeout has elapsed.
    pub fn is_expired(&self) -> bool {
        self.idle() > self.expiry
    }

    /// Time left before the session expires, zero if already expired.
    pub fn remaining(&self) -> Duration {
        self.expiry.saturating_sub(self.idle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn creds() -> Credentials {
        Credentials::new("h", "t", "p")
    }

    #[test]
    fn test_new_session_timestamps() {
        let session = Session::new(creds(), Duration::from_secs(60));
        assert_eq!(session.created_at(), session.last_used());
        assert!(!session.is_expired());
        assert_eq!(session.host(), "h");
    }

    #[test]
    fn test_touch_advances_last_used() {
        let mut session = Session::new(creds(), Duration::from_secs(60));
        let before = session.last_used();

        thread::sleep(Duration::from_millis(5));
        session.touch();

        assert!(session.last_used() > before);
        assert!(session.last_used() >= session.created_at());
    }

    #[test]
    fn test_expiration() {
        let session = Session::new(creds(), Duration::from_millis(10));
        thread::sleep(Duration::from_millis(20));

        assert!(session.is_expired());
        assert_eq!(session.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_touch_resets_timer() {
        let mut session = Session::new(creds(), Duration::from_millis(50));

        thread::sleep(Duration::from_millis(30));
        session.touch();
        thread::sleep(Duration::from_millis(30));

        // Would have expired without the touch
        assert!(!session.is_expired());
    }

    #[test]
    fn test_remaining_counts_down() {
        let session = Session::new(creds(), Duration::from_secs(3600));
        let remaining = session.remaining();
        assert!(remaining <= Duration::from_secs(3600));
        assert!(remaining > Duration::from_secs(3590));
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
