use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::grid::service::table_engine::TableEngine;

/// A mutation applied to each selected row (enable a function, allow-list an app...).
#[async_trait]
pub trait BulkRowAction<T: Sync>: Send + Sync {
    async fn apply(&self, row: &T) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub row_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run `action` over the selected rows one at a time, in data order.
///
/// Rows that succeed are deselected; rows that fail stay selected so the
/// user can retry them.
pub async fn run_bulk_action<T, A>(grid: &mut TableEngine<T>, action: &A) -> BulkReport
where
    T: Sync,
    A: BulkRowAction<T> + ?Sized,
{
    let mut report = BulkReport::default();

    for row in grid.selected_rows() {
        let row_id = grid.row_id(row);
        match action.apply(row).await {
            Ok(()) => report.succeeded.push(row_id),
            Err(e) => {
                warn!(row_id = %row_id, error = %e, "Bulk action failed for row");
                report.failed.push(BulkFailure {
                    row_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    for row_id in &report.succeeded {
        grid.set_selection(row_id, false);
    }

    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "Bulk action finished"
    );
    report
}
