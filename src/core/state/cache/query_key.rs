use std::fmt;

use crate::domain::log::model::{Cursor, LogFilters, LogType};
use crate::domain::retention::model::TimeInterval;

/// Composite identity of one log search request.
///
/// Two equal keys always denote the same backend request; the orchestrator
/// tags in-flight fetches with it and the cache is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub project_id: String,
    pub log_type: LogType,
    pub interval: TimeInterval,
    pub cursor: Option<Cursor>,
    pub page_size: u32,
    pub filters: LogFilters,
}

impl QueryKey {
    /// Same request on a different page.
    pub fn same_scope(&self, other: &QueryKey) -> bool {
        self.project_id == other.project_id
            && self.log_type == other.log_type
            && self.interval == other.interval
            && self.page_size == other.page_size
            && self.filters == other.filters
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}[{}..{})@{}x{}",
            self.project_id,
            self.log_type.as_code(),
            self.interval.start_rfc3339(),
            self.interval.end_rfc3339(),
            self.cursor.as_ref().map(Cursor::as_str).unwrap_or("-"),
            self.page_size,
        )?;
        for (k, v) in self.filters.iter() {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}
