pub mod query_cache;
pub mod query_key;

pub use query_cache::QueryCache;
pub use query_key::QueryKey;
