//! The gantry host runtime: configuration and the HTTP harness.

mod config;
mod server;

pub use config::GantryConfig;
pub use server::GantryServer;
