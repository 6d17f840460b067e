//! Resources served through `resources/list` and `resources/read`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use brickline_session::CredentialResolver;
use brickline_types::SqlWarehouse;
use tracing::debug;

use crate::error::{McpError, Result};
use crate::protocol::{ReadResourceResult, ResourceContents, ResourceInfo};

/// A readable resource.
#[async_trait]
pub trait Resource: Send + Sync {
    /// URI without query string, e.g. `schema://tables`.
    fn uri(&self) -> &str;

    /// Short name.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// MIME type of the text returned by [`read`](Self::read).
    fn mime_type(&self) -> &str {
        "text/plain"
    }

    /// Produce the resource text. `query` holds the URI's query parameters.
    async fn read(&self, query: &HashMap<String, String>) -> String;
}

/// Registry of resources keyed by URI.
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, Arc<dyn Resource>>,
}

impl ResourceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource, replacing any at the same URI.
    pub fn register<T: Resource + 'static>(&mut self, resource: T) {
        let uri = resource.uri().to_string();
        self.resources.insert(uri, Arc::new(resource));
    }

    /// Get the number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Definitions for `resources/list`.
    pub fn definitions(&self) -> Vec<ResourceInfo> {
        self.resources
            .values()
            .map(|r| ResourceInfo {
                uri: r.uri().to_string(),
                name: r.name().to_string(),
                description: Some(r.description().to_string()),
                mime_type: Some(r.mime_type().to_string()),
            })
            .collect()
    }

    /// Read the resource at `uri`, which may carry a query string.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult> {
        let (base, query) = split_uri(uri);
        let resource = self
            .resources
            .get(base)
            .cloned()
            .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))?;

        let text = resource.read(&query).await;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents {
                uri: uri.to_string(),
                mime_type: Some(resource.mime_type().to_string()),
                text,
            }],
        })
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Split a URI into its base and decoded query parameters.
fn split_uri(uri: &str) -> (&str, HashMap<String, String>) {
    match uri.split_once('?') {
        Some((base, query)) => {
            let params = url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();
            (base, params)
        }
        None => (uri, HashMap::new()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// schema://tables
// ─────────────────────────────────────────────────────────────────────────────

/// Lists every table visible to the warehouse, one per line.
pub struct TablesResource {
    resolver: CredentialResolver,
    warehouse: Arc<dyn SqlWarehouse>,
}

impl TablesResource {
    /// URI this resource is served at.
    pub const URI: &'static str = "schema://tables";

    /// Create the resource.
    pub fn new(resolver: CredentialResolver, warehouse: Arc<dyn SqlWarehouse>) -> Self {
        Self {
            resolver,
            warehouse,
        }
    }

    async fn tables(&self, session_id: Option<&str>) -> std::result::Result<String, String> {
        let credentials = self.resolver.resolve(session_id).map_err(|e| e.to_string())?;
        debug!(host = %credentials.host, "listing tables");
        let tables = self
            .warehouse
            .list_tables(&credentials)
            .await
            .map_err(|e| e.to_string())?;
        Ok(tables
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[async_trait]
impl Resource for TablesResource {
    fn uri(&self) -> &str {
        Self::URI
    }

    fn name(&self) -> &str {
        "tables"
    }

    fn description(&self) -> &str {
        "List of tables in the Databricks SQL warehouse. Append ?session_id=<id> to use a session."
    }

    async fn read(&self, query: &HashMap<String, String>) -> String {
        let session_id = query.get("session_id").map(String::as_str);
        match self.tables(session_id).await {
            Ok(text) => text,
            Err(e) => format!("Error retrieving tables: {}", e),
        }
    }
}

/// Build the registry with every Databricks resource.
pub fn databricks_resources(
    resolver: CredentialResolver,
    warehouse: Arc<dyn SqlWarehouse>,
) -> ResourceRegistry {
    let mut registry = ResourceRegistry::new();
    registry.register(TablesResource::new(resolver, warehouse));
    registry
}
