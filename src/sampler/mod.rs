//! Sampling loop
//!
//! Drives the prober repeatedly over a wall-clock window, sleeping a random
//! whole number of seconds between iterations. Iterations run strictly one
//! after another. Probe failures stay inside their iteration; anything else
//! that goes wrong in the loop body ends the run without a result.

use crate::{
    error::{AppError, Result},
    logging::Logger,
    models::SampleSequence,
    output::ConsoleFormatter,
    probe::{Probe, ProbeOutcome},
    types::IterationStatus,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Destination of per-iteration status lines
pub trait StatusSink: Send {
    fn append(&mut self, line: &str) -> Result<()>;
}

impl StatusSink for Vec<String> {
    fn append(&mut self, line: &str) -> Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Inclusive range of whole seconds slept between iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    min_secs: u64,
    max_secs: u64,
}

impl Jitter {
    pub fn new(min_secs: u64, max_secs: u64) -> Result<Self> {
        if min_secs > max_secs {
            return Err(AppError::config(format!(
                "Minimum interval ({}s) cannot exceed maximum interval ({}s)",
                min_secs, max_secs
            )));
        }
        Ok(Self { min_secs, max_secs })
    }

    pub fn min_secs(&self) -> u64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> u64 {
        self.max_secs
    }

    /// Draw a uniformly random pause from the range
    pub fn next_pause(&self) -> Duration {
        let secs = rand::thread_rng().gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs(secs)
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct SamplingRun {
    pub samples: SampleSequence,
    pub iterations: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub failed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SamplingRun {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            samples: SampleSequence::new(),
            iterations: 0,
            accepted: 0,
            rejected: 0,
            failed: 0,
            started_at,
            finished_at: started_at,
        }
    }

    fn record(&mut self, outcome: ProbeOutcome) -> Result<()> {
        self.iterations += 1;
        match outcome.status {
            IterationStatus::Accepted => self.accepted += 1,
            IterationStatus::Rejected => self.rejected += 1,
            IterationStatus::Failed => self.failed += 1,
        }
        if let Some(sample) = outcome.sample {
            self.samples.push(sample)?;
        }
        Ok(())
    }
}

/// Repeats a probe until the sampling window closes
pub struct SamplingLoop<P> {
    probe: P,
    duration: Duration,
    jitter: Jitter,
    progress: Option<ConsoleFormatter>,
    logger: Logger,
}

impl<P: Probe> SamplingLoop<P> {
    pub fn new(probe: P, duration: Duration, jitter: Jitter) -> Self {
        let mut logger = Logger::new("SAMPLER".to_string());
        logger.set_level(crate::logging::LogLevel::Error);
        Self {
            probe,
            duration,
            jitter,
            progress: None,
            logger,
        }
    }

    /// Print `Test Iteration: N` and the status line after every iteration
    pub fn with_progress(mut self, formatter: ConsoleFormatter) -> Self {
        self.progress = Some(formatter);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Run until the window closes, appending one status line per iteration to `sink`.
    ///
    /// A sink failure, or any other error escaping an iteration, is returned
    /// as `AppError::Fatal` and the accumulated samples are discarded.
    pub async fn run<S: StatusSink + ?Sized>(&self, sink: &mut S) -> Result<SamplingRun> {
        let mut run = SamplingRun::new(Utc::now());
        let deadline = Instant::now() + self.duration;
        let mut iteration = 0u64;

        self.logger
            .info("Sampling started")
            .field("target", self.probe.target().url())
            .field("duration_secs", self.duration.as_secs())
            .field("min_interval_secs", self.jitter.min_secs())
            .field("max_interval_secs", self.jitter.max_secs())
            .log()
            .await;

        while Instant::now() < deadline {
            iteration += 1;
            self.iterate(iteration, sink, &mut run).await.map_err(|e| {
                if matches!(e, AppError::Fatal(_)) {
                    e
                } else {
                    AppError::fatal(format!("iteration {} aborted the run: {}", iteration, e))
                }
            })?;

            sleep(self.jitter.next_pause()).await;
        }

        run.finished_at = Utc::now();

        self.logger
            .info("Sampling finished")
            .field("iterations", run.iterations)
            .field("accepted", run.accepted)
            .field("rejected", run.rejected)
            .field("failed", run.failed)
            .log()
            .await;

        Ok(run)
    }

    async fn iterate<S: StatusSink + ?Sized>(&self, iteration: u64, sink: &mut S, run: &mut SamplingRun) -> Result<()> {
        let outcome = self.probe.probe(iteration).await;

        if let Some(formatter) = &self.progress {
            println!("{}", formatter.format_progress(iteration, outcome.status, &outcome.status_line));
        }

        sink.append(&outcome.status_line)
            .map_err(|e| AppError::fatal(format!("Failed to write status log: {}", e)))?;

        run.record(outcome)
    }
}
