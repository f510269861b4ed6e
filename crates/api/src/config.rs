//! Configuration for the LexQA HTTP API server.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use lexqa_core::LexConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address to bind to.
    pub bind_addr: SocketAddr,

    /// Enable CORS.
    pub enable_cors: bool,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,

    /// Request timeout in seconds. Zero disables the timeout layer.
    pub request_timeout_seconds: u64,

    /// Enable request logging.
    pub enable_request_logging: bool,

    /// Enable response compression.
    pub enable_compression: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5040".parse().unwrap(),
            enable_cors: true,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            request_timeout_seconds: 90,
            enable_request_logging: true,
            enable_compression: true,
            max_body_size: 1024 * 1024, // 1MB, questions are small
        }
    }
}

impl ApiConfig {
    /// Derive API server configuration from the core configuration.
    pub fn from_core_config(core_config: &LexConfig) -> Self {
        let mut config = Self::default();

        config.bind_addr = format!("{}:{}", core_config.http.host, core_config.http.port)
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:5040".parse().unwrap());

        config.enable_cors = core_config.http.enable_cors;
        config.request_timeout_seconds = core_config.http.request_timeout;
        config.enable_request_logging = core_config.http.enable_request_logging;

        config
    }
}
