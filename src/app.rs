//! Main application orchestration and execution

use crate::{
    cli::Cli,
    client::NetworkClient,
    config::{display_config_summary, load_config},
    error::{AppError, Result},
    logging::{Logger, ProbeLogger},
    models::{Config, ProbeTarget},
    output::{create_raw_dump, run_stamp, ConsoleFormatter, StatusLog},
    probe::{Probe, StagedProber},
    report::{ReportArtifacts, ReportSink},
    sampler::{Jitter, SamplingLoop, SamplingRun},
    stats::RunSummary,
    timing::SystemPhaseTimer,
};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

/// Printed instead of a report when a run accepted no samples
pub const NO_RESULTS_MESSAGE: &str = "No results to generate report";

/// What a completed invocation produced
#[derive(Debug)]
pub struct RunOutcome {
    pub status_log: Option<PathBuf>,
    pub raw_dump: Option<PathBuf>,
    pub run: Option<SamplingRun>,
    pub report: Option<ReportArtifacts>,
}

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        Ok(Self { cli })
    }

    /// Run the application
    pub async fn run(self) -> Result<RunOutcome> {
        let config = load_config(self.cli.clone())?;

        if config.debug {
            println!("{}", crate::build_info());
            println!("\nConfiguration Summary:");
            println!("{}\n", display_config_summary(&config));
        }

        if let Some(raw_dump) = &self.cli.report_from {
            return report_only(&config, raw_dump).await;
        }

        let target = ProbeTarget::new(config.target_url.clone());
        let timer = SystemPhaseTimer::new(config.timeout());
        let fetcher = NetworkClient::with_timeout(config.timeout())?;
        let prober = StagedProber::new(target, timer, fetcher)
            .with_tcp_port(config.tcp_port)
            .with_logger(ProbeLogger::new(&config));

        run_sampling(&config, prober, Local::now()).await
    }
}

/// Sample with `probe`, then write the raw dump, summary and report
pub async fn run_sampling<P: Probe>(config: &Config, probe: P, started: DateTime<Local>) -> Result<RunOutcome> {
    let logger = Logger::with_config("APP".to_string(), config);
    let session_id = logger.start_session().await;
    logger.add_context_field("target".to_string(), &config.target_url).await;

    fs::create_dir_all(&config.output_dir).map_err(|e| {
        AppError::io(format!("Failed to create output directory {}: {}", config.output_dir.display(), e))
    })?;

    let formatter = ConsoleFormatter::new(config.enable_color);
    println!("{}\n", formatter.format_banner(config));

    let mut status_log = StatusLog::create_in(&config.output_dir, started)?;
    logger
        .info("Status log opened")
        .field("path", status_log.path().display().to_string())
        .log()
        .await;

    let sampler_logger = Logger::with_config("SAMPLER".to_string(), config);
    sampler_logger.set_session_id(session_id).await;

    let sampler = SamplingLoop::new(
        probe,
        config.duration(),
        Jitter::new(config.min_interval_seconds, config.max_interval_seconds)?,
    )
    .with_progress(formatter)
    .with_logger(sampler_logger);

    let run = sampler.run(&mut status_log).await?;

    let dump = create_raw_dump(&config.output_dir, &run_stamp(started), &run.samples)?;
    let raw_dump = dump.path;

    let summary = RunSummary::from_samples(&run.samples, crate::defaults::DEFAULT_PLOT_CAP);
    println!("\n{}", formatter.format_summary(&run, &summary));

    let report = if !config.generate_report {
        None
    } else if run.samples.is_empty() {
        println!("{}", NO_RESULTS_MESSAGE);
        None
    } else {
        let sink = ReportSink::new(&config.output_dir, dump.stamp)
            .with_logger(Logger::with_config("REPORT".to_string(), config));
        let artifacts = sink.generate(&raw_dump).await?;
        print_artifacts(&artifacts);
        Some(artifacts)
    };

    Ok(RunOutcome {
        status_log: Some(status_log.path().to_path_buf()),
        raw_dump: Some(raw_dump),
        run: Some(run),
        report,
    })
}

/// Regenerate the report for an existing raw dump
pub async fn report_only(config: &Config, raw_dump: &Path) -> Result<RunOutcome> {
    fs::create_dir_all(&config.output_dir).map_err(|e| {
        AppError::io(format!("Failed to create output directory {}: {}", config.output_dir.display(), e))
    })?;

    let sink = ReportSink::new(&config.output_dir, run_stamp(Local::now()))
        .with_logger(Logger::with_config("REPORT".to_string(), config));
    let artifacts = sink.generate(raw_dump).await?;
    print_artifacts(&artifacts);

    Ok(RunOutcome {
        status_log: None,
        raw_dump: Some(raw_dump.to_path_buf()),
        run: None,
        report: Some(artifacts),
    })
}

fn print_artifacts(artifacts: &ReportArtifacts) {
    println!("\nReport written:");
    for path in artifacts.all_paths() {
        println!("  {}", path.display());
    }
}
