//! Log search domain types

pub mod cursor;
pub mod log_blob;
pub mod log_columns;
pub mod log_filters;
pub mod log_page;
pub mod log_record;

pub use cursor::Cursor;
pub use log_blob::LogBlob;
pub use log_filters::LogFilters;
pub use log_page::LogPage;
pub use log_record::{FunctionExecution, LogRecord, LogType};
