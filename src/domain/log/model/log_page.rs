use serde::Serialize;

use crate::domain::log::model::cursor::Cursor;
use crate::domain::log::model::log_record::LogRecord;

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogPage {
    pub records: Vec<LogRecord>,
    pub total_count: u64,
    pub next_cursor: Option<Cursor>,
}

impl LogPage {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            total_count: 0,
            next_cursor: None,
        }
    }
}
