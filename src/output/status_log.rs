//! Append-only per-iteration status log

use super::{create_artifact, run_stamp};
use crate::{
    error::{AppError, Result},
    sampler::StatusSink,
};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Human-readable log of every iteration, one line each, flushed per write
#[derive(Debug)]
pub struct StatusLog {
    path: PathBuf,
    file: File,
}

impl StatusLog {
    /// Create a new `human_readable_results_<stamp>.txt` inside `dir`.
    ///
    /// A log left by another run started in the same second is not reused.
    pub fn create_in(dir: &Path, started: DateTime<Local>) -> Result<Self> {
        let artifact = create_artifact(dir, "human_readable_results", "txt", &run_stamp(started))?;
        Ok(Self {
            path: artifact.path,
            file: artifact.file,
        })
    }

    /// Open `path` for appending, creating it if needed
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::io(format!("Failed to open status log {}: {}", path.display(), e)))?;

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusSink for StatusLog {
    fn append(&mut self, line: &str) -> Result<()> {
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }
}
