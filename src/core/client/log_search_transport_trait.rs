use async_trait::async_trait;

use crate::core::state::cache::QueryKey;
use crate::domain::log::model::LogPage;
use crate::errors::LogSearchError;

/// The log search backend, as seen by the query orchestrator.
///
/// Timeouts and cancellation belong to the implementation; both surface only
/// as [`LogSearchError::Transport`].
#[async_trait]
pub trait LogSearchTransport: Send + Sync {
    async fn search(&self, key: &QueryKey) -> Result<LogPage, LogSearchError>;
}
