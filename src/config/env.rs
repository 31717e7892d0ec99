//! Environment variable handling and .env file loading

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variables read into the configuration
pub const CONFIG_ENV_VARS: &[&str] = &[
    "TARGET_URL",
    "TEST_DURATION",
    "MIN_INTERVAL",
    "MAX_INTERVAL",
    "TIMEOUT_SECONDS",
    "OUTPUT_DIR",
    "ENABLE_COLOR",
];

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the current directory if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load variables from `path` if it exists; variables already set win
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path)
                .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;

            if debug {
                println!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            println!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Check every known configuration variable that is set
    pub fn validate_environment() -> Result<()> {
        for key in CONFIG_ENV_VARS {
            if let Ok(value) = std::env::var(key) {
                Self::validate_env_var(key, &value)?;
            }
        }
        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "TARGET_URL" => {
                if !value.is_empty() {
                    let parsed = url::Url::parse(value)
                        .map_err(|e| AppError::config(format!("Invalid TARGET_URL '{}': {}", value, e)))?;
                    if !matches!(parsed.scheme(), "http" | "https") {
                        return Err(AppError::config(format!("TARGET_URL must use http or https: {}", value)));
                    }
                }
            }
            "TEST_DURATION" | "MIN_INTERVAL" | "MAX_INTERVAL" => {
                value.parse::<u64>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "TIMEOUT_SECONDS" => {
                let timeout: u64 = value.parse()
                    .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > 300 {
                    return Err(AppError::config(format!("TIMEOUT_SECONDS must be between 1 and 300, got: {}", timeout)));
                }
            }
            "ENABLE_COLOR" => {
                value.parse::<bool>()
                    .map_err(|_| AppError::config(format!("ENABLE_COLOR must be 'true' or 'false', got: '{}'", value)))?;
            }
            _ => {}
        }

        Ok(())
    }
}
