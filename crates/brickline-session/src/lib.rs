//! Credential-bearing sessions with inactivity expiry.
//!
//! This crate is the stateful core of brickline:
//! - [`Session`]: credentials plus creation and last-used timestamps
//! - [`SessionStore`]: lock-guarded map with lazy eviction on lookup
//! - [`CredentialResolver`]: session credentials or process-wide defaults
//! - [`SessionManager`]: login (with a connectivity probe), logout, status
//!
//! Expired sessions are only removed when they are next looked up. There is
//! no background sweep, so a session that is never used again stays in
//! memory until the process exits.
//!
//! # Example
//!
//! ```rust,ignore
//! use brickline_session::{SessionConfig, SessionManager};
//!
//! let manager = SessionManager::new(SessionConfig::default(), warehouse, defaults);
//! let outcome = manager.login("adb-1.azuredatabricks.net", token, http_path).await?;
//! let creds = manager.resolver().resolve(Some(&outcome.session_id.to_string()))?;
//! ```

mod config;
mod error;
mod manager;
mod resolver;
mod session;
mod store;

pub use config::{DEFAULT_PROBE_TIMEOUT, DEFAULT_TTL, SessionConfig};
pub use error::{Result, SessionError};
pub use manager::{LoginOutcome, SessionInfo, SessionManager};
pub use resolver::CredentialResolver;
pub use session::{Session, SessionId};
pub use store::SessionStore;
