//! HTTP client shared by the SQL and REST adapters.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{Result, WarehouseError};

/// Default timeout for a whole request, including statement polling.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default delay between statement status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Databricks workspace client.
///
/// Holds no credentials: every call takes the host and token it should use,
/// so a single client can serve sessions bound to different workspaces.
///
/// # Example
///
/// ```no_run
/// use brickline_warehouse::DatabricksClient;
/// use std::time::Duration;
///
/// # fn example() -> brickline_warehouse::Result<()> {
/// let client = DatabricksClient::builder()
///     .timeout(Duration::from_secs(60))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DatabricksClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) timeout: Duration,
    pub(crate) poll_interval: Duration,
}

/// Error body returned by the Databricks REST API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl DatabricksClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Overall request timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    /// Make a GET request.
    pub(crate) async fn get_json(&self, token: &str, url: Url) -> Result<Value> {
        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(token)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Make a POST request with a JSON body.
    pub(crate) async fn post_json(&self, token: &str, url: Url, body: &Value) -> Result<Value> {
        let response = self
            .inner
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .timeout(self.inner.timeout)
            .send()
            .await?;
        handle_response(response).await
    }
}

impl std::fmt::Debug for DatabricksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabricksClient")
            .field("timeout", &self.inner.timeout)
            .field("poll_interval", &self.inner.poll_interval)
            .finish()
    }
}

/// Base URL of a workspace.
///
/// A bare host gets `https://`; a host already carrying a scheme is used
/// as-is. The result always ends in `/` so relative joins append.
pub(crate) fn base_url(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let raw = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    let mut url = Url::parse(&raw).map_err(|source| WarehouseError::InvalidUrl {
        url: host.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

/// URL of a REST 2.0 endpoint, e.g. `jobs/list` or `jobs/get?job_id=1`.
pub(crate) fn api_url(host: &str, endpoint: &str) -> Result<Url> {
    let path = format!("api/2.0/{}", endpoint.trim_start_matches('/'));
    base_url(host)?
        .join(&path)
        .map_err(|source| WarehouseError::InvalidUrl { url: path, source })
}

/// Decode a successful response, or turn a failed one into an error.
///
/// An empty success body decodes as `{}`; some POST endpoints return nothing.
async fn handle_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(extract_error(response).await);
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(&text)?)
}

/// Extract an error from a failed response.
async fn extract_error(response: reqwest::Response) -> WarehouseError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = error_message(status, &text);

    if status == 401 || status == 403 {
        WarehouseError::Auth { status, message }
    } else {
        WarehouseError::Api { status, message }
    }
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error_code: Some(code),
            message: Some(message),
        }) => format!("{}: {}", code, message),
        Ok(ErrorResponse {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorResponse {
            error_code: Some(code),
            ..
        }) => code,
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}

/// Builder for creating a [`DatabricksClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    timeout: Duration,
    poll_interval: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            user_agent: None,
        }
    }

    /// Set the overall request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the delay between statement status polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<DatabricksClient> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("brickline/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(DatabricksClient {
            inner: Arc::new(ClientInner {
                http,
                timeout: self.timeout,
                poll_interval: self.poll_interval,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
