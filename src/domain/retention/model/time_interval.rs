use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;

use crate::errors::LogSearchError;

/// Half-open `[start, end)` window attached to a log query.
///
/// Always `start < end`. Built only through [`TimeInterval::new`], which the
/// date range resolver calls; once a query carries it, it is never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, LogSearchError> {
        if start >= end {
            return Err(LogSearchError::InvalidRange(format!(
                "start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// RFC3339 with millisecond precision and a `Z` suffix, as the backend expects.
    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
