//! Configuration management for Crptgate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ratelimit::TimeWindow;

/// Main configuration for the Crptgate client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint URL for document submission
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// How long a submission may wait for a permit before giving up.
    /// `None` waits indefinitely.
    #[serde(default)]
    pub acquire_timeout_ms: Option<u64>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            acquire_timeout_ms: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.crpt.ru/v1/documents".to_string()
}

fn default_user_agent() -> String {
    format!("crptgate/{}", env!("CARGO_PKG_VERSION"))
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Rate limiting configuration.
///
/// The window duration is `window.duration() * window_amount`, e.g.
/// `window: second, window_amount: 30` caps requests per 30 seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests allowed per window
    #[serde(default = "default_request_limit")]
    pub request_limit: u32,

    /// Time unit of the window
    #[serde(default = "default_window")]
    pub window: TimeWindow,

    /// Number of window units per window
    #[serde(default = "default_window_amount")]
    pub window_amount: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_limit: default_request_limit(),
            window: default_window(),
            window_amount: default_window_amount(),
        }
    }
}

fn default_request_limit() -> u32 {
    100
}

fn default_window() -> TimeWindow {
    TimeWindow::Second
}

fn default_window_amount() -> u32 {
    1
}

impl RateLimitConfig {
    /// The full window duration.
    pub fn window_duration(&self) -> Duration {
        self.window.duration() * self.window_amount
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::CrptError::Config(e.to_string()))?;
        Ok(config)
    }
}
