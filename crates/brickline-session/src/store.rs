//! Lock-guarded session store with lazy eviction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brickline_types::Credentials;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::session::{Session, SessionId};

/// Process-wide mapping from session id to [`Session`].
///
/// A single mutex guards the whole map, so a lookup (expiry check, touch,
/// snapshot) and a delete of the same id never interleave. Lookups return
/// snapshots; the store remains the only owner of the live entities.
///
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<SessionId, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store whose sessions expire after `ttl` of inactivity.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Inactivity timeout stamped onto new sessions.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored sessions, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Create and register a new session, returning a snapshot of it.
    pub fn create(&self, credentials: Credentials) -> Session {
        let mut sessions = self.inner.lock();

        let mut id = SessionId::new();
        while sessions.contains_key(&id) {
            id = SessionId::new();
        }

        let session = Session::with_id(id, credentials, self.ttl);
        sessions.insert(id, session.clone());

        trace!(
            session_id = %id,
            store_size = sessions.len(),
            "Session inserted into store"
        );

        session
    }

    /// Look up a live session.
    ///
    /// An expired session is removed and reported as absent. A live one is
    /// touched, and the snapshot returned carries the updated `last_used`.
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        let mut sessions = self.inner.lock();

        let expired = sessions.get(id)?.is_expired();
        if expired {
            sessions.remove(id);
            debug!(session_id = %id, "Session expired, removing from store");
            return None;
        }

        let session = sessions.get_mut(id)?;
        session.touch();
        trace!(session_id = %id, "Session found in store");
        Some(session.clone())
    }

    /// Remove a session. Returns whether it existed.
    pub fn delete(&self, id: &SessionId) -> bool {
        let removed = self.inner.lock().remove(id).is_some();
        if removed {
            debug!(session_id = %id, "Session removed from store");
        }
        removed
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
