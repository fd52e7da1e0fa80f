use std::sync::Arc;

use crate::domain::log::model::LogPage;
use crate::errors::LogSearchError;

/// Observable state of the log query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QueryState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A fetch is outstanding. `previous` is the page kept on screen meanwhile;
    /// it is `None` when the time interval changed (the grid shows a spinner).
    Pending { previous: Option<Arc<LogPage>> },
    Error { reason: LogSearchError },
    Success(Arc<LogPage>),
}

impl QueryState {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending { .. })
    }

    /// Pending with nothing to show.
    pub fn shows_loading_indicator(&self) -> bool {
        matches!(self, QueryState::Pending { previous: None })
    }

    /// The page to display, if any.
    pub fn data(&self) -> Option<&Arc<LogPage>> {
        match self {
            QueryState::Success(page) => Some(page),
            QueryState::Pending { previous } => previous.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LogSearchError> {
        match self {
            QueryState::Error { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            QueryState::Idle => "idle",
            QueryState::Pending { .. } => "pending",
            QueryState::Error { .. } => "error",
            QueryState::Success(_) => "success",
        }
    }
}
