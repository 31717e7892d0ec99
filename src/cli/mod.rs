//! Command-line interface

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Latency Sampler - periodically probes one URL and reports DNS, TCP and HTTP latency
#[derive(Parser, Debug, Clone)]
#[command(name = "lsamp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Target URL probed on every iteration
    #[arg(long)]
    pub url: Option<String>,

    /// Length of the sampling window in seconds
    #[arg(short, long, value_parser = parse_seconds)]
    pub duration: Option<u64>,

    /// Minimum pause between iterations in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub min_interval: Option<u64>,

    /// Maximum pause between iterations in seconds (inclusive)
    #[arg(long, value_parser = parse_seconds)]
    pub max_interval: Option<u64>,

    /// Per-phase network timeout in seconds
    #[arg(short, long, value_parser = parse_timeout)]
    pub timeout: Option<u64>,

    /// Port used by the TCP connect phase
    #[arg(long)]
    pub tcp_port: Option<u16>,

    /// Directory for the status log, raw dump and report files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Sampling preset; explicit flags take precedence
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Skip graphs and the combined report
    #[arg(long)]
    pub no_report: bool,

    /// Build the report from an existing raw dump instead of sampling
    #[arg(long, value_name = "RAW_DUMP")]
    pub report_from: Option<PathBuf>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

/// Recommended sampling schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Half an hour, 10 to 31 seconds apart
    Conservative,
    /// Half an hour, 3 to 10 seconds apart
    Aggressive,
}

impl Preset {
    pub fn duration_seconds(&self) -> u64 {
        1800
    }

    /// Inclusive pause range in seconds
    pub fn interval_range(&self) -> (u64, u64) {
        match self {
            Preset::Conservative => (10, 31),
            Preset::Aggressive => (3, 10),
        }
    }
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let (Some(min), Some(max)) = (self.min_interval, self.max_interval) {
            if min > max {
                return Err(format!(
                    "--min-interval ({}) cannot exceed --max-interval ({})",
                    min, max
                ));
            }
        }

        if self.report_from.is_some() && self.no_report {
            return Err("--report-from cannot be combined with --no-report".to_string());
        }

        Ok(())
    }

    /// Explicit color choice from the command line, if any
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        self.color_override().unwrap_or_else(supports_color)
    }
}

/// Parse a whole number of seconds
fn parse_seconds(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid number of seconds: {}", s));
    }
    s.parse::<u64>().map_err(|_| format!("Invalid number of seconds: {}", s))
}

/// Parse a timeout in seconds, 1 to 300
fn parse_timeout(s: &str) -> Result<u64, String> {
    parse_seconds(s).and_then(|secs| {
        if secs == 0 {
            Err("Timeout must be greater than 0".to_string())
        } else if secs > 300 {
            Err("Timeout cannot exceed 300 seconds".to_string())
        } else {
            Ok(secs)
        }
    })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    cfg!(unix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::parse_from(["lsamp"]);
        assert!(cli.url.is_none());
        assert!(cli.duration.is_none());
        assert!(cli.preset.is_none());
        assert!(!cli.no_report);
        assert!(cli.report_from.is_none());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "lsamp",
            "--url", "https://example.com/page.html",
            "--duration", "60",
            "--min-interval", "2",
            "--max-interval", "5",
            "--timeout", "15",
            "--tcp-port", "8443",
            "--output-dir", "/tmp/out",
            "--preset", "aggressive",
            "--no-report",
            "--no-color",
            "--verbose",
            "--debug",
        ]);

        assert_eq!(cli.url.as_deref(), Some("https://example.com/page.html"));
        assert_eq!(cli.duration, Some(60));
        assert_eq!(cli.min_interval, Some(2));
        assert_eq!(cli.max_interval, Some(5));
        assert_eq!(cli.timeout, Some(15));
        assert_eq!(cli.tcp_port, Some(8443));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(cli.preset, Some(Preset::Aggressive));
        assert!(cli.no_report);
        assert!(cli.no_color);
        assert!(cli.verbose);
        assert!(cli.debug);
        assert_eq!(cli.color_override(), Some(false));
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["lsamp", "-d", "0", "-t", "5", "-o", "out"]);
        assert_eq!(cli.duration, Some(0));
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_timeout_bounds() {
        assert!(Cli::try_parse_from(["lsamp", "--timeout", "0"]).is_err());
        assert!(Cli::try_parse_from(["lsamp", "--timeout", "301"]).is_err());
        assert!(Cli::try_parse_from(["lsamp", "--timeout", "300"]).is_ok());
        assert!(Cli::try_parse_from(["lsamp", "--timeout", "+5"]).is_err());
        assert!(Cli::try_parse_from(["lsamp", "--duration", "-1"]).is_err());
    }

    #[test]
    fn test_unknown_preset_rejected() {
        assert!(Cli::try_parse_from(["lsamp", "--preset", "reckless"]).is_err());
    }

    #[test]
    fn test_validation_conflicts() {
        let cli = Cli::parse_from(["lsamp", "--color", "--no-color"]);
        assert!(cli.validate().is_err());

        let cli = Cli::parse_from(["lsamp", "--min-interval", "9", "--max-interval", "3"]);
        assert!(cli.validate().unwrap_err().contains("--min-interval"));

        let cli = Cli::parse_from(["lsamp", "--report-from", "raw.txt", "--no-report"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_report_only() {
        let cli = Cli::parse_from(["lsamp", "--report-from", "raw_results_1.txt"]);
        assert_eq!(cli.report_from, Some(PathBuf::from("raw_results_1.txt")));
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::Conservative.interval_range(), (10, 31));
        assert_eq!(Preset::Aggressive.interval_range(), (3, 10));
        assert_eq!(Preset::Aggressive.duration_seconds(), 1800);
    }

    #[test]
    fn test_color_flags() {
        assert!(Cli::parse_from(["lsamp", "--color"]).use_colors());
        assert!(!Cli::parse_from(["lsamp", "--no-color"]).use_colors());
        assert_eq!(Cli::parse_from(["lsamp"]).color_override(), None);
    }
}
