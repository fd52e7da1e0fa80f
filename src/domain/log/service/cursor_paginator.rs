use serde::Serialize;
use tracing::debug;

use crate::domain::log::model::{Cursor, LogFilters};
use crate::domain::retention::model::TimeInterval;

/// Everything a cursor is bound to. A change in any field invalidates all cursors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageScope {
    pub interval: TimeInterval,
    pub filters: LogFilters,
    pub page_size: u32,
}

/// Position report for the paging controls ("showing 21-30 of 35").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub page_index: usize,
    pub page_number: usize,
    pub first_row: u64,
    pub last_row: u64,
    pub total_count: u64,
    pub can_go_next: bool,
    pub can_go_previous: bool,
}

/// Back/forward navigation over a forward-only cursor protocol.
///
/// `history` holds the cursor each earlier page was fetched with (`None` for
/// the first page), so `history.len()` is always the current page index.
#[derive(Debug, Clone, Default)]
pub struct CursorPaginator {
    current: Option<Cursor>,
    history: Vec<Option<Cursor>>,
    next: Option<Cursor>,
    scope: Option<PageScope>,
}

impl CursorPaginator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor to send with the fetch for the page being shown.
    pub fn current_cursor(&self) -> Option<&Cursor> {
        self.current.as_ref()
    }

    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next.as_ref()
    }

    pub fn page_index(&self) -> usize {
        self.history.len()
    }

    pub fn can_go_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn can_go_previous(&self) -> bool {
        !self.history.is_empty()
    }

    /// Store the continuation token returned for the current page.
    pub fn record_response(&mut self, next_cursor: Option<Cursor>) {
        self.next = next_cursor;
    }

    /// Advance one page. No-op (returns `false`) when no next cursor is known.
    pub fn load_next(&mut self) -> bool {
        let Some(next) = self.next.take() else {
            debug!(page = self.page_index(), "load_next ignored: no next cursor");
            return false;
        };

        let leaving = self.current.replace(next);
        self.history.push(leaving);
        debug!(page = self.page_index(), "Advanced to next page");
        true
    }

    /// Step back one page. No-op (returns `false`) on the first page.
    pub fn load_previous(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            debug!("load_previous ignored: already on first page");
            return false;
        };

        // The page we return to continues with the cursor we are leaving.
        self.next = std::mem::replace(&mut self.current, previous);
        debug!(page = self.page_index(), "Stepped back to previous page");
        true
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
        self.next = None;
    }

    /// Bind the paginator to `scope`, resetting when it differs from the last one.
    ///
    /// Returns `true` if a reset happened.
    pub fn sync_scope(&mut self, scope: &PageScope) -> bool {
        if self.scope.as_ref() == Some(scope) {
            return false;
        }

        let had_scope = self.scope.is_some();
        self.scope = Some(scope.clone());
        self.reset();
        if had_scope {
            debug!("Query scope changed; pagination reset");
        }
        had_scope
    }

    pub fn summary(&self, rows_on_page: usize, total_count: u64, page_size: u32) -> PageSummary {
        let offset = self.page_index() as u64 * u64::from(page_size);
        let rows = rows_on_page as u64;

        PageSummary {
            page_index: self.page_index(),
            page_number: self.page_index() + 1,
            first_row: if rows == 0 { 0 } else { offset + 1 },
            last_row: offset + rows,
            total_count,
            can_go_next: self.can_go_next(),
            can_go_previous: self.can_go_previous(),
        }
    }
}
