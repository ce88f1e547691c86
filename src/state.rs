//! Shared application state
//!
//! The two proxy endpoints are stateless per-request handlers; the only
//! process-wide resources are the immutable configuration and one shared
//! HTTP client with its connection pool.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;

pub struct AppState {
    pub config: ServerConfig,
    pub http: reqwest::Client,
}

impl AppState {
    /// Build the shared state from a loaded configuration.
    ///
    /// When `vendor_timeout_seconds` is set, the timeout applies to every
    /// outbound vendor call; otherwise outbound calls wait indefinitely.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.vendor_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let http = builder.build().expect("Failed to build HTTP client");

        Arc::new(Self { config, http })
    }
}
