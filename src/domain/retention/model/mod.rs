//! Retention domain types (presets, intervals, entitlements)

pub mod range_preset;
pub mod retention_entitlement;
pub mod time_interval;

pub use range_preset::RangePreset;
pub use retention_entitlement::{Plan, RetentionEntitlement};
pub use time_interval::TimeInterval;
