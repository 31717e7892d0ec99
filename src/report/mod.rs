//! Reporting sink
//!
//! Turns a raw sample dump into three latency charts, a combined HTML report
//! and a JSON summary, all written next to each other in the output directory.

mod chart;
mod document;

pub use chart::render_chart;
pub use document::render_document;

use crate::{
    error::{AppError, ErrorContext, Result},
    logging::Logger,
    models::SampleSequence,
    output::read_raw_dump,
    stats::{downsample, RunSummary},
    types::Phase,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Chart order in the report
pub const CHART_ORDER: [Phase; 3] = [Phase::Http, Phase::Tcp, Phase::Dns];

/// Files written by one report generation
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifacts {
    pub charts: Vec<(Phase, PathBuf)>,
    pub document: PathBuf,
    pub summary: PathBuf,
}

impl ReportArtifacts {
    pub fn chart(&self, phase: Phase) -> Option<&Path> {
        self.charts.iter().find(|(p, _)| *p == phase).map(|(_, path)| path.as_path())
    }

    /// Every written file, charts first
    pub fn all_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.charts.iter().map(|(_, p)| p.as_path()).collect();
        paths.push(&self.document);
        paths.push(&self.summary);
        paths
    }
}

/// Contents of `summary_<stamp>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub generated_at: DateTime<Local>,
    pub source: Option<String>,
    pub plot_cap: usize,
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// Escape text for inclusion in SVG or HTML
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Writes charts and the combined report for a finished run
pub struct ReportSink {
    output_dir: PathBuf,
    stamp: String,
    plot_cap: usize,
    logger: Logger,
}

impl ReportSink {
    /// Sink writing into `output_dir`, naming files with `stamp`
    pub fn new<P: Into<PathBuf>>(output_dir: P, stamp: impl Into<String>) -> Self {
        let mut logger = Logger::new("REPORT".to_string());
        logger.set_level(crate::logging::LogLevel::Error);
        Self {
            output_dir: output_dir.into(),
            stamp: stamp.into(),
            plot_cap: crate::defaults::DEFAULT_PLOT_CAP,
            logger,
        }
    }

    pub fn with_plot_cap(mut self, cap: usize) -> Self {
        self.plot_cap = cap;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    fn artifact_path(&self, prefix: &str, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.{}", prefix, self.stamp, ext))
    }

    /// Parse the raw dump at `raw_dump` and report on it.
    ///
    /// A malformed line fails the whole report; nothing is written.
    pub async fn generate(&self, raw_dump: &Path) -> Result<ReportArtifacts> {
        let samples = read_raw_dump(raw_dump)?;
        self.write_report(&samples, Some(raw_dump)).await
    }

    /// Report on samples already in memory
    pub async fn generate_from_samples(&self, samples: &SampleSequence) -> Result<ReportArtifacts> {
        self.write_report(samples, None).await
    }

    async fn write_report(&self, samples: &SampleSequence, source: Option<&Path>) -> Result<ReportArtifacts> {
        if samples.is_empty() {
            return Err(AppError::report("No samples to report"));
        }

        let summary = RunSummary::from_samples(samples, self.plot_cap);
        let generated = Local::now();

        let mut charts = Vec::with_capacity(CHART_ORDER.len());
        let mut rendered = Vec::with_capacity(CHART_ORDER.len());
        for phase in CHART_ORDER {
            let series_summary = summary
                .phase(phase)
                .ok_or_else(|| AppError::internal(format!("No {} summary for a non-empty run", phase)))?;
            let points = downsample(&samples.series(phase), self.plot_cap);
            let svg = render_chart(phase, &points, series_summary);

            let path = self.artifact_path(phase.file_stem(), "svg");
            write_file(&path, &svg)?;
            self.logger
                .debug("Chart written")
                .field("phase", phase.label())
                .field("points", points.len())
                .field("path", path.display().to_string())
                .log()
                .await;

            charts.push((phase, path));
            rendered.push((phase, svg));
        }

        let document = self.artifact_path("graphed_results", "html");
        write_file(&document, &render_document(&rendered, samples, generated))?;

        let summary_path = self.artifact_path("summary", "json");
        let report_summary = ReportSummary {
            generated_at: generated,
            source: source.map(|p| p.display().to_string()),
            plot_cap: self.plot_cap,
            summary,
        };
        let json = serde_json::to_string_pretty(&report_summary)
            .context("Failed to serialize report summary")?;
        write_file(&summary_path, &json)?;

        self.logger
            .info("Report generated")
            .field("samples", samples.len())
            .field("document", document.display().to_string())
            .log()
            .await;

        Ok(ReportArtifacts {
            charts,
            document,
            summary: summary_path,
        })
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| AppError::report(format!("Failed to write {}: {}", path.display(), e)))
}
