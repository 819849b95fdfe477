//! Configuration types for the alert feed service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Alert feed polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_polling_interval", with = "humantime_serde")]
    pub polling_interval: Duration,
    /// Skip alerts whose `(created_at, message)` is already shown
    #[serde(default)]
    pub dedupe_by_identity: bool,
    /// Raise a notice when a poll adds new alerts
    #[serde(default = "default_true")]
    pub notify_new_alerts: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            polling_interval: default_polling_interval(),
            dedupe_by_identity: false,
            notify_new_alerts: true,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_toast_history_size")]
    pub toast_history_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            toast_history_size: default_toast_history_size(),
        }
    }
}

impl Config {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.feed.polling_interval.is_zero() {
            return Err(crate::AlertFeedError::Config(
                "feed.polling_interval must be greater than zero".to_string(),
            ));
        }
        if self.feed.base_url.trim().is_empty() {
            return Err(crate::AlertFeedError::Config(
                "feed.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_polling_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_toast_history_size() -> usize {
    20
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::AlertFeedError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
