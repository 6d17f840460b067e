//! Shared types for brickline.
//!
//! This crate holds the values that cross crate boundaries:
//! - [`Credentials`] / [`ApiCredentials`] resolved for a single call
//! - [`QueryResult`] and [`TableInfo`] returned by the SQL collaborator
//! - The capability traits [`SqlWarehouse`] and [`WorkspaceApi`] that the
//!   session core and the MCP tools depend on, implemented by adapters in
//!   `brickline-warehouse`

pub mod capability;
pub mod credentials;
pub mod error;
pub mod query;

pub use capability::{HttpMethod, SqlWarehouse, WorkspaceApi};
pub use credentials::{ApiCredentials, Credentials};
pub use error::{CollaboratorError, CollaboratorResult};
pub use query::{QueryResult, TableInfo};
