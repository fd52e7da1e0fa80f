//! Retention window policy and time-range resolution

pub mod model;
pub mod service;
