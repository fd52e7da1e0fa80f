pub mod client;
pub mod config;
pub mod state;
pub mod util;
