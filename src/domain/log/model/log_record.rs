use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError};

use crate::domain::log::model::log_blob::LogBlob;

/// Kind of log stream queried from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    #[default]
    FunctionExecution,
}

impl LogType {
    pub fn as_code(&self) -> &'static str {
        match self {
            LogType::FunctionExecution => "function_execution",
        }
    }
}

/// One line item returned by the log backend. Never mutated client-side.
///
/// Decoding is lenient per field: an off-shape value falls back to its
/// default instead of failing the whole page.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_execution: Option<FunctionExecution>,
}

/// Execution payload nested inside a function execution log.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExecution {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub app_name: String,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub function_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_execution_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_execution_end_time: Option<String>,
    /// Seconds.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_execution_duration: Option<f64>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "blob_text", skip_serializing_if = "Option::is_none")]
    pub function_input: Option<String>,
    #[serde(default, deserialize_with = "blob_text", skip_serializing_if = "Option::is_none")]
    pub function_output: Option<String>,
    #[serde(default, deserialize_with = "blob_text", skip_serializing_if = "Option::is_none")]
    pub function_execution_error: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub function_input_truncated: bool,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub function_output_truncated: bool,
}

/// Blob fields are JSON-encoded strings on the wire; a structured value sent
/// in their place is re-encoded so it still renders.
fn blob_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

impl LogRecord {
    /// Stable grid key: the backend request id when present, else a composite.
    pub fn row_id(&self) -> String {
        if let Some(id) = self.request_id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        match &self.function_execution {
            Some(exec) => format!("{}:{}:{}", self.timestamp, exec.app_name, exec.function_name),
            None => self.timestamp.clone(),
        }
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    pub fn app_name(&self) -> Option<&str> {
        self.function_execution.as_ref().map(|e| e.app_name.as_str())
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function_execution
            .as_ref()
            .map(|e| e.function_name.as_str())
    }

    pub fn success(&self) -> Option<bool> {
        self.function_execution.as_ref().and_then(|e| e.success)
    }

    pub fn status_label(&self) -> &'static str {
        match self.success() {
            Some(true) => "success",
            Some(false) => "failed",
            None => "unknown",
        }
    }
}

impl FunctionExecution {
    pub fn input(&self) -> LogBlob {
        LogBlob::parse("function_input", self.function_input.as_deref())
    }

    pub fn output(&self) -> LogBlob {
        LogBlob::parse("function_output", self.function_output.as_deref())
    }

    pub fn error(&self) -> LogBlob {
        LogBlob::parse(
            "function_execution_error",
            self.function_execution_error.as_deref(),
        )
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.function_execution_start_time
            .as_deref()
            .and_then(parse_timestamp)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.function_execution_end_time
            .as_deref()
            .and_then(parse_timestamp)
    }

    pub fn duration_display(&self) -> String {
        match self.function_execution_duration {
            Some(secs) => format_duration_secs(secs),
            None => "-".to_string(),
        }
    }
}

/// ISO-8601 with or without an offset; naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_duration_secs(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "-".to_string();
    }
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.2}s")
    } else {
        let minutes = (secs / 60.0).floor();
        format!("{}m {:.0}s", minutes as u64, secs - minutes * 60.0)
    }
}
