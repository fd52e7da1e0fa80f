pub mod date_range_resolver;
pub mod retention_policy;
