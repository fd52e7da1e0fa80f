use serde::Serialize;
use serde_with::skip_serializing_none;
use validator::Validate;

use crate::core::state::cache::QueryKey;

/// Query string of `GET /v1/logs/search`. Extra filters are appended separately.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LogSearchRequestDto {
    pub log_type: String,
    /// RFC3339
    pub start_time: String,
    pub end_time: Option<String>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: u32,
    pub cursor: Option<String>,
    #[validate(length(min = 1))]
    pub project_id: String,
}

impl From<&QueryKey> for LogSearchRequestDto {
    fn from(key: &QueryKey) -> Self {
        Self {
            log_type: key.log_type.as_code().to_string(),
            start_time: key.interval.start_rfc3339(),
            end_time: Some(key.interval.end_rfc3339()),
            limit: key.page_size,
            cursor: key.cursor.as_ref().map(|c| c.as_str().to_string()),
            project_id: key.project_id.clone(),
        }
    }
}
