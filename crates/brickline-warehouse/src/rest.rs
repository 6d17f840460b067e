//! Workspace REST 2.0 adapter.

use async_trait::async_trait;
use brickline_types::{ApiCredentials, CollaboratorResult, HttpMethod, WorkspaceApi};
use serde_json::Value;
use tracing::debug;

use crate::client::{DatabricksClient, api_url};

#[async_trait]
impl WorkspaceApi for DatabricksClient {
    /// Call `{host}/api/2.0/{endpoint}`.
    ///
    /// GET sends no body; query parameters belong in `endpoint`. POST sends
    /// `payload`, or `{}` when there is none.
    async fn request(
        &self,
        credentials: &ApiCredentials,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&Value>,
    ) -> CollaboratorResult<Value> {
        let url = api_url(&credentials.host, endpoint)?;
        debug!(%method, path = url.path(), "workspace API request");

        let value = match method {
            HttpMethod::Get => self.get_json(&credentials.token, url).await?,
            HttpMethod::Post => {
                let empty = Value::Object(Default::default());
                self.post_json(&credentials.token, url, payload.unwrap_or(&empty))
                    .await?
            }
        };
        Ok(value)
    }
}
