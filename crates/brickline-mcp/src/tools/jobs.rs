//! Jobs API tools: list_jobs, get_job_status, get_job_details.

use std::sync::Arc;

use async_trait::async_trait;
use brickline_session::CredentialResolver;
use brickline_types::{HttpMethod, WorkspaceApi};
use serde_json::{Value, json};
use tracing::debug;

use super::session_id_property;
use crate::format::{NOT_AVAILABLE, epoch_millis_text, field_text, markdown_table};
use crate::tool::{ParamExt, Tool, ToolResult};

/// Shared plumbing for tools that call the Jobs REST API.
#[derive(Clone)]
struct JobsClient {
    resolver: CredentialResolver,
    api: Arc<dyn WorkspaceApi>,
}

impl JobsClient {
    async fn get(&self, params: &Value, endpoint: &str) -> Result<Value, String> {
        let session_id = params
            .optional_str("session_id")
            .map_err(|e| e.to_string())?;
        let credentials = self
            .resolver
            .resolve_api(session_id)
            .map_err(|e| e.to_string())?;

        debug!(host = %credentials.host, endpoint, "calling jobs API");
        self.api
            .request(&credentials, endpoint, HttpMethod::Get, None)
            .await
            .map_err(|e| e.to_string())
    }
}

fn job_id_arg(params: &Value) -> Result<String, String> {
    let job_id = params
        .required_id("job_id", "the numeric id of the job")
        .map_err(|e| e.to_string())?;
    if !job_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("job_id must be numeric, got '{}'", job_id));
    }
    Ok(job_id)
}

fn job_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "job_id": {
                "type": ["integer", "string"],
                "description": description
            },
            "session_id": session_id_property()
        },
        "required": ["job_id"]
    })
}

fn creator(job: &Value) -> String {
    field_text(
        job.get("creator_user_name")
            .or_else(|| job.get("created_by")),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// list_jobs
// ─────────────────────────────────────────────────────────────────────────────

/// Lists every job in the workspace.
pub struct ListJobsTool {
    client: JobsClient,
}

impl ListJobsTool {
    /// Create the tool.
    pub fn new(resolver: CredentialResolver, api: Arc<dyn WorkspaceApi>) -> Self {
        Self {
            client: JobsClient { resolver, api },
        }
    }
}

#[async_trait]
impl Tool for ListJobsTool {
    fn name(&self) -> &str {
        "list_jobs"
    }

    fn description(&self) -> &str {
        "List all Databricks jobs"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property()
            }
        })
    }

    async fn execute(&self, params: Value) -> ToolResult {
        match self.client.get(&params, "jobs/list").await {
            Ok(response) => ToolResult::text(render_jobs(&response)),
            Err(e) => ToolResult::error(format!("Error listing jobs: {}", e)),
        }
    }
}

fn render_jobs(response: &Value) -> String {
    let jobs = match response.get("jobs").and_then(Value::as_array) {
        Some(jobs) if !jobs.is_empty() => jobs,
        _ => return "No jobs found.".to_string(),
    };

    let rows: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| {
            vec![
                field_text(job.get("job_id")),
                field_text(job.pointer("/settings/name")),
                creator(job),
            ]
        })
        .collect();
    markdown_table(&["Job ID", "Job Name", "Created By"], &rows)
}

// ─────────────────────────────────────────────────────────────────────────────
// get_job_status
// ─────────────────────────────────────────────────────────────────────────────

/// Shows the recent runs of a job.
pub struct GetJobStatusTool {
    client: JobsClient,
}

impl GetJobStatusTool {
    /// Create the tool.
    pub fn new(resolver: CredentialResolver, api: Arc<dyn WorkspaceApi>) -> Self {
        Self {
            client: JobsClient { resolver, api },
        }
    }

    async fn run(&self, params: &Value) -> Result<String, String> {
        let job_id = job_id_arg(params)?;
        let endpoint = format!("jobs/runs/list?job_id={}", job_id);
        let response = self.client.get(params, &endpoint).await?;
        Ok(render_runs(&job_id, &response))
    }
}

#[async_trait]
impl Tool for GetJobStatusTool {
    fn name(&self) -> &str {
        "get_job_status"
    }

    fn description(&self) -> &str {
        "Get the status of recent runs of a Databricks job"
    }

    fn parameters(&self) -> Value {
        job_id_schema("ID of the job to get runs for")
    }

    async fn execute(&self, params: Value) -> ToolResult {
        match self.run(&params).await {
            Ok(text) => ToolResult::text(text),
            Err(e) => ToolResult::error(format!("Error getting job status: {}", e)),
        }
    }
}

fn render_runs(job_id: &str, response: &Value) -> String {
    let runs = match response.get("runs").and_then(Value::as_array) {
        Some(runs) if !runs.is_empty() => runs,
        _ => return format!("No runs found for job {}.", job_id),
    };

    let rows: Vec<Vec<String>> = runs
        .iter()
        .map(|run| {
            vec![
                field_text(run.get("run_id")),
                field_text(run.pointer("/state/life_cycle_state")),
                field_text(run.pointer("/state/result_state")),
                epoch_millis_text(run.get("start_time")),
            ]
        })
        .collect();

    format!(
        "## Runs for job {}\n\n{}",
        job_id,
        markdown_table(&["Run ID", "State", "Result", "Start Time"], &rows)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// get_job_details
// ─────────────────────────────────────────────────────────────────────────────

/// Shows the settings of a job.
pub struct GetJobDetailsTool {
    client: JobsClient,
}

impl GetJobDetailsTool {
    /// Create the tool.
    pub fn new(resolver: CredentialResolver, api: Arc<dyn WorkspaceApi>) -> Self {
        Self {
            client: JobsClient { resolver, api },
        }
    }

    async fn run(&self, params: &Value) -> Result<String, String> {
        let job_id = job_id_arg(params)?;
        let endpoint = format!("jobs/get?job_id={}", job_id);
        let response = self.client.get(params, &endpoint).await?;
        Ok(render_job_details(&response))
    }
}

#[async_trait]
impl Tool for GetJobDetailsTool {
    fn name(&self) -> &str {
        "get_job_details"
    }

    fn description(&self) -> &str {
        "Get the settings of a Databricks job: schedule, tasks, and ownership"
    }

    fn parameters(&self) -> Value {
        job_id_schema("ID of the job to describe")
    }

    async fn execute(&self, params: Value) -> ToolResult {
        match self.run(&params).await {
            Ok(text) => ToolResult::text(text),
            Err(e) => ToolResult::error(format!("Error getting job details: {}", e)),
        }
    }
}

fn render_job_details(job: &Value) -> String {
    let schedule = match job.pointer("/settings/schedule") {
        Some(schedule) => format!(
            "{} ({}, {})",
            field_text(schedule.get("quartz_cron_expression")),
            field_text(schedule.get("timezone_id")),
            field_text(schedule.get("pause_status")),
        ),
        None => NOT_AVAILABLE.to_string(),
    };

    let mut text = format!(
        "## Job Details\n\n\
         **Job ID**: {}\n\
         **Name**: {}\n\
         **Created By**: {}\n\
         **Created**: {}\n\
         **Schedule**: {}\n\
         **Max Concurrent Runs**: {}\n",
        field_text(job.get("job_id")),
        field_text(job.pointer("/settings/name")),
        creator(job),
        epoch_millis_text(job.get("created_time")),
        schedule,
        field_text(job.pointer("/settings/max_concurrent_runs")),
    );

    let tasks = job
        .pointer("/settings/tasks")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if !tasks.is_empty() {
        let rows: Vec<Vec<String>> = tasks
            .iter()
            .map(|task| vec![field_text(task.get("task_key")), task_kind(task), depends_on(task)])
            .collect();
        text.push_str("\n### Tasks\n\n");
        text.push_str(&markdown_table(&["Task Key", "Type", "Depends On"], &rows));
    }

    text
}

/// The `*_task` key present on a task, e.g. `notebook_task`.
fn task_kind(task: &Value) -> String {
    task.as_object()
        .and_then(|obj| {
            obj.keys()
                .find(|k| k.ends_with("_task"))
                .cloned()
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn depends_on(task: &Value) -> String {
    let keys: Vec<String> = task
        .get("depends_on")
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(|d| d.get("task_key").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if keys.is_empty() {
        "-".to_string()
    } else {
        keys.join(", ")
    }
}
