use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MalformedBlob;

/// Display form of a JSON-encoded payload carried on a log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LogBlob {
    Empty,
    Json(Value),
    /// Raw text shown when the payload is not valid JSON (or was cut short).
    Raw(String),
}

impl LogBlob {
    /// Parse one blob field. Never fails; malformed JSON degrades to [`LogBlob::Raw`].
    pub fn parse(field: &'static str, raw: Option<&str>) -> Self {
        match Self::try_parse(field, raw) {
            Ok(blob) => blob,
            Err(err) => {
                debug!(field = err.field, reason = %err.reason, "Rendering malformed blob as raw text");
                LogBlob::Raw(raw.unwrap_or_default().to_string())
            }
        }
    }

    pub fn try_parse(field: &'static str, raw: Option<&str>) -> Result<Self, MalformedBlob> {
        let Some(raw) = raw else {
            return Ok(LogBlob::Empty);
        };
        if raw.trim().is_empty() {
            return Ok(LogBlob::Empty);
        }

        serde_json::from_str::<Value>(raw)
            .map(LogBlob::Json)
            .map_err(|e| MalformedBlob {
                field,
                reason: e.to_string(),
            })
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, LogBlob::Raw(_))
    }

    /// Pretty text for the detail pane.
    pub fn render(&self) -> String {
        match self {
            LogBlob::Empty => String::new(),
            LogBlob::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            LogBlob::Raw(text) => text.clone(),
        }
    }

    /// Single-line preview cut to `max_chars` characters, with an ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = match self {
            LogBlob::Empty => return String::new(),
            LogBlob::Json(value) => value.to_string(),
            LogBlob::Raw(text) => text.replace(['\n', '\r'], " "),
        };
        truncate_chars(&flat, max_chars)
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
