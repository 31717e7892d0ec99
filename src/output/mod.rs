//! Console output and run artifacts
//!
//! This module provides the colored console formatter used during a run, the
//! append-only status log, and the raw sample dump consumed by reporting.

mod dump;
mod status_log;

pub use dump::{
    create_raw_dump, encode_record, parse_raw_dump, read_raw_dump, write_raw_dump, RAW_DUMP_HEADER, RAW_DUMP_VERSION,
};
pub use status_log::StatusLog;

use crate::{
    error::{AppError, Result},
    models::Config,
    sampler::SamplingRun,
    stats::{RunSummary, SeriesSummary},
    types::{IterationStatus, Phase},
};
use chrono::{DateTime, Local};
use colored::*;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const MAX_STAMP_SUFFIX: u32 = 1000;

/// Timestamp component shared by every artifact of one run
pub fn run_stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// A freshly created run artifact
#[derive(Debug)]
pub struct Artifact {
    pub path: PathBuf,
    /// Stamp actually used in the file name, suffix included
    pub stamp: String,
    pub file: File,
}

/// Create `<prefix>_<stamp>.<ext>` in `dir` without touching an existing file.
///
/// When the name is taken, `_2`, `_3`, ... is appended to the stamp until a
/// free name is found.
pub fn create_artifact(dir: &Path, prefix: &str, ext: &str, stamp: &str) -> Result<Artifact> {
    for n in 1..=MAX_STAMP_SUFFIX {
        let candidate = if n == 1 { stamp.to_string() } else { format!("{}_{}", stamp, n) };
        let path = dir.join(format!("{}_{}.{}", prefix, candidate, ext));

        match OpenOptions::new().append(true).create_new(true).open(&path) {
            Ok(file) => {
                return Ok(Artifact {
                    path,
                    stamp: candidate,
                    file,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(AppError::io(format!("Failed to create {}: {}", path.display(), e))),
        }
    }

    Err(AppError::io(format!(
        "No free {}_{}*.{} name left in {}",
        prefix,
        stamp,
        ext,
        dir.display()
    )))
}

/// Colored console formatter for progress and the end-of-run summary
#[derive(Debug, Clone, Copy)]
pub struct ConsoleFormatter {
    enable_color: bool,
}

impl ConsoleFormatter {
    pub fn new(enable_color: bool) -> Self {
        Self { enable_color }
    }

    pub fn enable_color(&self) -> bool {
        self.enable_color
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    /// Run banner printed before the first iteration
    pub fn format_banner(&self, config: &Config) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}", self.bold("Latency Sampler"));
        let _ = writeln!(output, "{}", self.colorize(&"-".repeat(60), Color::BrightBlack));
        let _ = writeln!(output, "Target:    {}", self.colorize(&config.target_url, Color::Cyan));
        let _ = writeln!(output, "Duration:  {}s", config.duration_seconds);
        let _ = writeln!(
            output,
            "Interval:  {}-{}s (random)",
            config.min_interval_seconds, config.max_interval_seconds
        );
        let _ = write!(output, "Timeout:   {}s", config.timeout_seconds);
        output
    }

    /// Progress block for one iteration: counter line, then the status line
    pub fn format_progress(&self, iteration: u64, status: IterationStatus, status_line: &str) -> String {
        let color = match status {
            IterationStatus::Accepted => Color::Green,
            IterationStatus::Rejected => Color::Yellow,
            IterationStatus::Failed => Color::Red,
        };

        format!(
            "{}\n{}",
            self.bold(&format!("Test Iteration: {}", iteration)),
            self.colorize(status_line, color)
        )
    }

    /// Final table of per-phase statistics and iteration counts
    pub fn format_summary(&self, run: &SamplingRun, summary: &RunSummary) -> String {
        let mut output = String::new();
        let rule = self.colorize(&"-".repeat(60), Color::BrightBlack);

        let _ = writeln!(output, "{}", self.bold("Run Summary"));
        let _ = writeln!(output, "{}", rule);
        let _ = writeln!(output, "{}", self.bold(&format!("{:<8} {:>12} {:>12} {:>12}", "Phase", "Mean", "Min", "Max")));

        for phase in Phase::ALL {
            let row = match summary.phase(phase) {
                Some(s) => self.format_row(phase, s),
                None => format!("{:<8} {:>12} {:>12} {:>12}", phase.label(), "-", "-", "-"),
            };
            let _ = writeln!(output, "{}", row);
        }

        let _ = writeln!(output, "{}", rule);

        let rate = if run.iterations == 0 {
            0.0
        } else {
            run.accepted as f64 * 100.0 / run.iterations as f64
        };
        let rate_color = if rate >= 95.0 {
            Color::Green
        } else if rate >= 80.0 {
            Color::Yellow
        } else {
            Color::Red
        };

        let _ = writeln!(
            output,
            "Accepted {}/{} iterations ({})",
            run.accepted,
            run.iterations,
            self.colorize(&format!("{:.1}%", rate), rate_color)
        );
        let _ = write!(output, "Rejected: {}  Failed: {}", run.rejected, run.failed);

        if summary.negative_http_samples > 0 {
            let _ = write!(
                output,
                "\n{}",
                self.colorize(
                    &format!("{} samples have a negative derived HTTP latency", summary.negative_http_samples),
                    Color::Yellow
                )
            );
        }

        output
    }

    fn format_row(&self, phase: Phase, summary: &SeriesSummary) -> String {
        format!(
            "{:<8} {:>10.3}ms {:>10.3}ms {:>10.3}ms",
            phase.label(),
            summary.mean,
            summary.min,
            summary.max
        )
    }
}
