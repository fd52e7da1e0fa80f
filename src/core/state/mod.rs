pub mod cache;
pub mod runtime;
