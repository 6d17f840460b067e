//! Markdown rendering for tool output.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Placeholder for fields a response does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// Render a markdown table.
///
/// Cells are escaped so a `|` or newline in the data cannot break the layout.
pub fn markdown_table<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut table = String::new();
    table.push_str(&row_line(headers.iter().map(|h| escape_cell(h.as_ref()))));
    table.push_str(&row_line(headers.iter().map(|_| "---".to_string())));
    for row in rows {
        table.push_str(&row_line(row.iter().map(|c| escape_cell(c))));
    }
    table
}

fn row_line(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |\n", cells.join(" | "))
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Text of a single result cell. SQL `NULL` renders as `NULL`.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text of a JSON field, or `N/A` when absent or null.
pub fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Wall-clock timestamp as `%Y-%m-%d %H:%M:%S`.
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Epoch-milliseconds field rendered as a UTC timestamp, or `N/A`.
pub fn epoch_millis_text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_i64)
        .filter(|ms| *ms > 0)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| format!("{} UTC", timestamp(&at)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Human wording of a duration, e.g. `1 hour`, `30 minutes`, `45 seconds`.
pub fn duration_text(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (count, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
