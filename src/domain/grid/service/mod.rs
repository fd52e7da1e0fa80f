pub mod bulk_selection_service;
pub mod table_engine;
