pub mod log_scope_config;

pub use log_scope_config::LogScopeConfig;
