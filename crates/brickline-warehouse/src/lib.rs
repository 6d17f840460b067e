//! Databricks adapters for brickline.
//!
//! [`DatabricksClient`] implements both capability traits from
//! `brickline-types`:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SqlWarehouse                                                │
//! │  - SQL Statement Execution API (/api/2.0/sql/statements)     │
//! │  - warehouse id taken from the http_path                     │
//! └──────────────────────────────────────────────────────────────┘
//! ┌──────────────────────────────────────────────────────────────┐
//! │  WorkspaceApi                                                │
//! │  - GET/POST https://{host}/api/2.0/{endpoint}                │
//! │  - bearer token auth                                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Credentials are passed per call; the client itself holds only the HTTP
//! connection settings, so one instance serves every session.

pub mod client;
pub mod error;
pub mod rest;
pub mod statement;

pub use client::{ClientBuilder, DatabricksClient};
pub use error::{Result, WarehouseError};
pub use statement::warehouse_id_from_http_path;
