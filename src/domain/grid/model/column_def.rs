use std::fmt;

use crate::domain::grid::model::cell_value::CellValue;

pub type Accessor<T> = Box<dyn Fn(&T) -> CellValue + Send + Sync>;

/// Declares one grid column over rows of type `T`.
///
/// Columns are sortable and not searchable unless stated otherwise; the global
/// filter only looks at columns explicitly marked [`ColumnDef::searchable`].
pub struct ColumnDef<T> {
    id: String,
    header: String,
    accessor: Accessor<T>,
    searchable: bool,
    sortable: bool,
}

impl<T> ColumnDef<T> {
    pub fn new<F>(id: impl Into<String>, header: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            header: header.into(),
            accessor: Box::new(accessor),
            searchable: false,
            sortable: true,
        }
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("searchable", &self.searchable)
            .field("sortable", &self.sortable)
            .finish()
    }
}
