//! Configuration data model and validation

use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest sampling window accepted
const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target URL probed on every iteration
    #[serde(default = "default_target_url")]
    pub target_url: String,

    /// Length of the sampling window in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_seconds: u64,

    /// Lower bound of the inter-iteration jitter, in seconds
    #[serde(default = "default_min_interval")]
    pub min_interval_seconds: u64,

    /// Upper bound of the inter-iteration jitter, in seconds (inclusive)
    #[serde(default = "default_max_interval")]
    pub max_interval_seconds: u64,

    /// Per-phase network timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Port used by the TCP connect phase
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,

    /// Directory receiving the status log, raw dump and report files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Generate graphs and the combined report after the run
    #[serde(default = "default_generate_report")]
    pub generate_report: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            duration_seconds: default_duration_secs(),
            min_interval_seconds: default_min_interval(),
            max_interval_seconds: default_max_interval(),
            timeout_seconds: default_timeout_secs(),
            tcp_port: default_tcp_port(),
            output_dir: default_output_dir(),
            generate_report: default_generate_report(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get the sampling window as Duration
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.target_url.is_empty() {
            return Err(AppError::config("Target URL cannot be empty"));
        }

        let parsed = url::Url::parse(&self.target_url)
            .map_err(|e| AppError::config(format!("Invalid target URL '{}': {}", self.target_url, e)))?;

        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::config(format!(
                    "Unsupported URL scheme '{}' (expected http or https)",
                    scheme
                )))
            }
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(AppError::config(format!("Target URL '{}' has no host", self.target_url)));
        }

        if self.min_interval_seconds > self.max_interval_seconds {
            return Err(AppError::config(format!(
                "Minimum interval ({}s) cannot exceed maximum interval ({}s)",
                self.min_interval_seconds, self.max_interval_seconds
            )));
        }

        if self.duration_seconds > MAX_DURATION_SECS {
            return Err(AppError::config("Duration cannot exceed 7 days"));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > 300 {
            return Err(AppError::config("Timeout cannot exceed 300 seconds"));
        }

        if self.tcp_port == 0 {
            return Err(AppError::config("TCP port must be greater than 0"));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(target_url) = std::env::var("TARGET_URL") {
            let target_url = target_url.trim();
            if !target_url.is_empty() {
                self.target_url = target_url.to_string();
            }
        }

        if let Ok(duration) = std::env::var("TEST_DURATION") {
            self.duration_seconds = duration.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TEST_DURATION value '{}': {}", duration, e)))?;
        }

        if let Ok(min_interval) = std::env::var("MIN_INTERVAL") {
            self.min_interval_seconds = min_interval.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MIN_INTERVAL value '{}': {}", min_interval, e)))?;
        }

        if let Ok(max_interval) = std::env::var("MAX_INTERVAL") {
            self.max_interval_seconds = max_interval.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid MAX_INTERVAL value '{}': {}", max_interval, e)))?;
        }

        if let Ok(timeout) = std::env::var("TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(output_dir) = std::env::var("OUTPUT_DIR") {
            if !output_dir.trim().is_empty() {
                self.output_dir = PathBuf::from(output_dir.trim());
            }
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_target_url() -> String {
    crate::defaults::DEFAULT_TARGET_URL.to_string()
}

fn default_duration_secs() -> u64 {
    crate::defaults::DEFAULT_DURATION.as_secs()
}

fn default_min_interval() -> u64 {
    crate::defaults::DEFAULT_MIN_INTERVAL_SECS
}

fn default_max_interval() -> u64 {
    crate::defaults::DEFAULT_MAX_INTERVAL_SECS
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_tcp_port() -> u16 {
    crate::defaults::DEFAULT_TCP_PORT
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_OUTPUT_DIR)
}

fn default_generate_report() -> bool {
    true
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
