use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::debug;

use crate::domain::grid::model::{ColumnDef, GridState, SortDirection, SortSpec};
use crate::errors::GridError;

pub type RowKey<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

/// Filterable, sortable, selectable view over rows of type `T`.
///
/// Rows are identified by a caller-supplied key extractor, never by position,
/// so selection is stable across filtering, sorting and data reloads.
pub struct TableEngine<T> {
    columns: Vec<ColumnDef<T>>,
    row_key: RowKey<T>,
    rows: Vec<T>,
    row_ids: Vec<String>,
    present: HashSet<String>,
    loaded: bool,
    state: GridState,
}

impl<T> TableEngine<T> {
    pub fn new<K>(columns: Vec<ColumnDef<T>>, row_key: K) -> Self
    where
        K: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            columns,
            row_key: Box::new(row_key),
            rows: Vec::new(),
            row_ids: Vec::new(),
            present: HashSet::new(),
            loaded: false,
            state: GridState::default(),
        }
    }

    /// Start from caller-supplied defaults (sort order, filter, pre-selection).
    pub fn with_state(mut self, state: GridState) -> Result<Self, GridError> {
        for spec in &state.sort {
            self.sortable_column(&spec.column_id)?;
        }
        self.state = state;
        Ok(self)
    }

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn row_id(&self, row: &T) -> String {
        (self.row_key)(row)
    }

    // ============================================================
    // Data
    // ============================================================

    /// Replace the data set. Selected ids that no longer exist are dropped.
    ///
    /// Rejects the new rows (leaving the old ones in place) when two of them
    /// share an id. Returns how many selections were dropped.
    pub fn set_rows(&mut self, rows: Vec<T>) -> Result<usize, GridError> {
        let mut present = HashSet::with_capacity(rows.len());
        let mut row_ids = Vec::with_capacity(rows.len());

        for row in &rows {
            let id = (self.row_key)(row);
            if !present.insert(id.clone()) {
                return Err(GridError::DuplicateRowId(id));
            }
            row_ids.push(id);
        }

        self.rows = rows;
        self.row_ids = row_ids;
        self.present = present;
        self.loaded = true;

        let before = self.state.selection.len();
        let present = &self.present;
        self.state.selection.retain(|id, _| present.contains(id));
        let dropped = before - self.state.selection.len();

        if dropped > 0 {
            debug!(dropped, "Dropped selections for rows no longer present");
        }
        Ok(dropped)
    }

    // ============================================================
    // Filter
    // ============================================================

    pub fn set_global_filter(&mut self, text: impl Into<String>) {
        self.state.global_filter = text.into();
    }

    pub fn global_filter(&self) -> &str {
        &self.state.global_filter
    }

    /// Whether `row` passes the global filter. Only searchable columns count.
    pub fn matches_filter(&self, row: &T) -> bool {
        let needle = self.state.global_filter.to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.columns
            .iter()
            .filter(|c| c.is_searchable())
            .any(|c| c.value(row).search_text().contains(&needle))
    }

    // ============================================================
    // Sort
    // ============================================================

    /// Sort by a single column, replacing any existing sort.
    pub fn set_sort(&mut self, column_id: &str, direction: SortDirection) -> Result<(), GridError> {
        self.set_sorting(vec![SortSpec::new(column_id, direction)])
    }

    /// Add (or re-prioritise) a column as the lowest-priority sort key.
    pub fn push_sort(&mut self, column_id: &str, direction: SortDirection) -> Result<(), GridError> {
        self.sortable_column(column_id)?;
        self.state.sort.retain(|s| s.column_id != column_id);
        self.state.sort.push(SortSpec::new(column_id, direction));
        Ok(())
    }

    /// Replace the full multi-column sort. Earlier entries take priority.
    pub fn set_sorting(&mut self, specs: Vec<SortSpec>) -> Result<(), GridError> {
        for spec in &specs {
            self.sortable_column(&spec.column_id)?;
        }
        self.state.sort = specs;
        Ok(())
    }

    pub fn clear_sort(&mut self) {
        self.state.sort.clear();
    }

    fn sortable_column(&self, column_id: &str) -> Result<usize, GridError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.id() == column_id)
            .ok_or_else(|| GridError::UnknownColumn(column_id.to_string()))?;

        if !self.columns[idx].is_sortable() {
            return Err(GridError::ColumnNotSortable(column_id.to_string()));
        }
        Ok(idx)
    }

    // ============================================================
    // View
    // ============================================================

    fn visible_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.rows.len())
            .filter(|&i| self.matches_filter(&self.rows[i]))
            .collect();

        let keys: Vec<(usize, SortDirection)> = self
            .state
            .sort
            .iter()
            .filter_map(|s| {
                self.columns
                    .iter()
                    .position(|c| c.id() == s.column_id)
                    .map(|idx| (idx, s.direction))
            })
            .collect();

        if keys.is_empty() {
            return indices;
        }

        // `sort_by` is stable, so equal rows keep their data order.
        indices.sort_by(|&a, &b| {
            keys.iter()
                .map(|&(col, dir)| {
                    let column = &self.columns[col];
                    let ord = column.value(&self.rows[a]).compare(&column.value(&self.rows[b]));
                    match dir {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        indices
    }

    /// Filtered and sorted rows, as displayed.
    pub fn visible_rows(&self) -> Vec<&T> {
        self.visible_indices()
            .into_iter()
            .map(|i| &self.rows[i])
            .collect()
    }

    pub fn visible_row_ids(&self) -> Vec<String> {
        self.visible_indices()
            .into_iter()
            .map(|i| self.row_ids[i].clone())
            .collect()
    }

    // ============================================================
    // Selection
    // ============================================================

    /// Select or deselect one row. Ids not in the current data set are ignored.
    pub fn set_selection(&mut self, row_id: &str, selected: bool) -> bool {
        if !self.present.contains(row_id) {
            debug!(row_id, "Ignoring selection change for unknown row");
            return false;
        }

        if selected {
            self.state.selection.insert(row_id.to_string(), true);
        } else {
            self.state.selection.remove(row_id);
        }
        true
    }

    pub fn toggle_selection(&mut self, row_id: &str) -> bool {
        let selected = self.is_selected(row_id);
        self.set_selection(row_id, !selected)
    }

    pub fn is_selected(&self, row_id: &str) -> bool {
        self.state.selection.get(row_id).copied().unwrap_or(false)
    }

    pub fn selection(&self) -> BTreeSet<String> {
        self.state.selected_ids()
    }

    /// Selected rows in data order, including ones hidden by the filter.
    pub fn selected_rows(&self) -> Vec<&T> {
        self.rows
            .iter()
            .zip(&self.row_ids)
            .filter(|(_, id)| self.is_selected(id))
            .map(|(row, _)| row)
            .collect()
    }

    /// Select every row that passes the filter. Hidden rows are untouched.
    pub fn select_all(&mut self) -> usize {
        let ids = self.visible_row_ids();
        let count = ids.len();
        for id in ids {
            self.state.selection.insert(id, true);
        }
        count
    }

    /// Deselect every row that passes the filter. Hidden selections survive.
    pub fn clear_all(&mut self) -> usize {
        let ids = self.visible_row_ids();
        let before = self.state.selection.len();
        for id in &ids {
            self.state.selection.remove(id);
        }
        before - self.state.selection.len()
    }

    /// Replace the selection from a hosting workflow.
    ///
    /// Before the first [`TableEngine::set_rows`] the ids are kept as-is and
    /// pruned on load; afterwards unknown ids are dropped immediately.
    pub fn seed_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.selection = ids
            .into_iter()
            .map(Into::into)
            .filter(|id| !self.loaded || self.present.contains(id))
            .map(|id| (id, true))
            .collect();
    }

    /// Hand the selection to a hosting workflow and clear it.
    pub fn take_selection(&mut self) -> BTreeSet<String> {
        let ids = self.selection();
        self.state.selection.clear();
        ids
    }

    pub fn clear_selection(&mut self) {
        self.state.selection.clear();
    }
}

impl<T> fmt::Debug for TableEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableEngine")
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .field("state", &self.state)
            .finish()
    }
}
