use serde::Deserialize;
use serde_with::{serde_as, VecSkipError};

use crate::domain::log::model::{Cursor, LogPage, LogRecord};

/// Entries that are not records at all are skipped; off-shape fields inside
/// a record are handled by [`LogRecord`] itself.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct LogSearchResponseDto {
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(default)]
    pub logs: Vec<LogRecord>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl From<LogSearchResponseDto> for LogPage {
    fn from(dto: LogSearchResponseDto) -> Self {
        LogPage {
            records: dto.logs,
            total_count: dto.total_count,
            next_cursor: Cursor::from_wire(dto.cursor),
        }
    }
}
