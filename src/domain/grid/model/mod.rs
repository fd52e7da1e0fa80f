//! Generic grid building blocks

pub mod cell_value;
pub mod column_def;
pub mod grid_state;

pub use cell_value::CellValue;
pub use column_def::ColumnDef;
pub use grid_state::{GridState, SortDirection, SortSpec};
