//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::{Cli, Preset},
    config::env::EnvManager,
    error::{AppError, Result},
    models::Config,
};

/// Configuration parser layering defaults, `.env`, environment, preset and CLI
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        self.cli.validate().map_err(AppError::config)?;

        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        EnvManager::validate_environment()?;
        config.merge_from_env()?;

        if let Some(preset) = self.cli.preset {
            apply_preset(&mut config, preset);
        }

        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(url) = &cli.url {
            config.target_url = url.clone();
        }
        if let Some(duration) = cli.duration {
            config.duration_seconds = duration;
        }
        if let Some(min) = cli.min_interval {
            config.min_interval_seconds = min;
        }
        if let Some(max) = cli.max_interval {
            config.max_interval_seconds = max;
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(port) = cli.tcp_port {
            config.tcp_port = port;
        }
        if let Some(dir) = &cli.output_dir {
            config.output_dir = dir.clone();
        }
        if cli.no_report {
            config.generate_report = false;
        }
        if let Some(enable) = cli.color_override() {
            config.enable_color = enable;
        } else if std::env::var("NO_COLOR").is_ok() {
            config.enable_color = false;
        }

        // CLI-only flags
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

/// Overwrite the sampling schedule with a preset
pub fn apply_preset(config: &mut Config, preset: Preset) {
    let (min, max) = preset.interval_range();
    config.duration_seconds = preset.duration_seconds();
    config.min_interval_seconds = min;
    config.max_interval_seconds = max;
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let summary = [
        format!("Target URL: {}", config.target_url),
        format!("Duration: {}s", config.duration_seconds),
        format!("Interval: {}-{}s", config.min_interval_seconds, config.max_interval_seconds),
        format!("Timeout: {}s", config.timeout_seconds),
        format!("TCP Port: {}", config.tcp_port),
        format!("Output Directory: {}", config.output_dir.display()),
        format!("Generate Report: {}", config.generate_report),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ];

    summary.join("\n")
}
