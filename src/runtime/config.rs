//! Host runtime configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for the gantry host server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GantryConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Environment variables passed to every invocation.
    pub env: HashMap<String, String>,
    /// Whether to enable the health check endpoint.
    pub enable_health: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Chain timeout ceiling in seconds.
    pub chain_timeout: u64,
}

impl Default for GantryConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            env: HashMap::new(),
            enable_health: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
            chain_timeout: 10,
        }
    }
}

impl GantryConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the chain timeout ceiling in seconds.
    pub fn chain_timeout(mut self, seconds: u64) -> Self {
        self.chain_timeout = seconds;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the chain timeout as a duration.
    pub fn chain_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.chain_timeout)
    }
}
