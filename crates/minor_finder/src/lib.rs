pub mod catalog;
pub mod config;
pub mod progress;
pub mod requirements;
pub mod server;
pub mod types;
