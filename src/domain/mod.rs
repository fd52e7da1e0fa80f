pub mod grid;
pub mod log;
pub mod retention;
