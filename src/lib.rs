//! Latency Sampler
//!
//! Periodically probes a single target URL, timing DNS resolution, TCP
//! connection setup and the full HTTP request separately, then renders the
//! collected samples as charts and a combined report.

pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod report;
pub mod sampler;
pub mod stats;
pub mod timing;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, ProbeTarget, Sample, SampleSequence};
pub use probe::{Probe, ProbeOutcome, StagedProber};
pub use report::{ReportArtifacts, ReportSink};
pub use sampler::{Jitter, SamplingLoop, SamplingRun, StatusSink};
pub use stats::{downsample, RunSummary, SeriesSummary};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const BUILD_TIME: &str = env!("BUILD_TIME");

/// Version line with build metadata, e.g. `latency-sampler v0.1.0 (abc1234, built ...)`
pub fn build_info() -> String {
    match option_env!("GIT_COMMIT") {
        Some(commit) => format!("{} v{} ({}, built {})", PKG_NAME, VERSION, commit, BUILD_TIME),
        None => format!("{} v{} (built {})", PKG_NAME, VERSION, BUILD_TIME),
    }
}

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TARGET_URL: &str = "https://cttools.co.uk/shape_sed.html";
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(1800);
    pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 10;
    pub const DEFAULT_MAX_INTERVAL_SECS: u64 = 31;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_TCP_PORT: u16 = 443;
    pub const DEFAULT_OUTPUT_DIR: &str = ".";
    pub const DEFAULT_ENABLE_COLOR: bool = true;
    /// Series longer than this are averaged into buckets before plotting
    pub const DEFAULT_PLOT_CAP: usize = 50;
}
