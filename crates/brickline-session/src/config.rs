//! Configuration for the session subsystem.

use std::time::Duration;

/// Default inactivity timeout for sessions (one hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default upper bound on the login connectivity probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the session subsystem.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inactivity timeout stamped onto every new session.
    pub ttl: Duration,

    /// How long login waits for the connectivity probe.
    pub probe_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inactivity timeout.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the login probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
