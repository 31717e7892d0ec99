//! Versioned raw sample dump
//!
//! The dump is plain text: a version header followed by one tab-separated
//! record per sample, `<seq>\t<http_ms>\t<dns_ms>\t<tcp_ms>`. Floats use the
//! shortest representation that parses back to the same value, so a dump
//! re-read by the reporting step reproduces the run's samples exactly.

use super::{create_artifact, Artifact};
use crate::{
    error::{AppError, Result},
    models::{Sample, SampleSequence},
};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const RAW_DUMP_VERSION: u32 = 1;
pub const RAW_DUMP_HEADER: &str = "# latency-sampler raw v1";

const HEADER_PREFIX: &str = "# latency-sampler raw v";

/// One dump record, without the trailing newline
pub fn encode_record(sample: &Sample) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        sample.sequence_number, sample.http_latency_ms, sample.dns_latency_ms, sample.tcp_latency_ms
    )
}

/// Append `samples` to the dump at `path`, writing the header if the file is new or empty
pub fn write_raw_dump(path: &Path, samples: &SampleSequence) -> Result<()> {
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::io(format!("Failed to open raw dump {}: {}", path.display(), e)))?;

    let mut buffer = String::new();
    if needs_header {
        buffer.push_str(RAW_DUMP_HEADER);
        buffer.push('\n');
    }
    for sample in samples {
        buffer.push_str(&encode_record(sample));
        buffer.push('\n');
    }

    file.write_all(buffer.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Write `samples` to a new `raw_results_<stamp>.txt` in `dir`.
///
/// The dump of an earlier run is never appended to; a taken name gets a
/// numeric suffix instead.
pub fn create_raw_dump(dir: &Path, stamp: &str, samples: &SampleSequence) -> Result<Artifact> {
    let artifact = create_artifact(dir, "raw_results", "txt", stamp)?;
    write_raw_dump(&artifact.path, samples)?;
    Ok(artifact)
}

/// Read and parse the dump at `path`
pub fn read_raw_dump(path: &Path) -> Result<SampleSequence> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read raw dump {}: {}", path.display(), e)))?;
    parse_raw_dump(&text)
}

/// Parse dump text into an ordered sample sequence
pub fn parse_raw_dump(text: &str) -> Result<SampleSequence> {
    let mut samples = SampleSequence::new();
    let mut seen_header = false;
    let mut last_sequence = 0u64;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if !seen_header {
            parse_header(line, line_no)?;
            seen_header = true;
            continue;
        }

        let sample = parse_record(line, line_no)?;
        if sample.sequence_number <= last_sequence {
            return Err(line_error(
                line_no,
                format!(
                    "sequence number {} does not follow {}",
                    sample.sequence_number, last_sequence
                ),
            ));
        }
        last_sequence = sample.sequence_number;
        samples.push(sample)?;
    }

    if !seen_header {
        return Err(AppError::parse("Raw dump is empty: missing version header"));
    }

    Ok(samples)
}

fn line_error(line_no: usize, message: String) -> AppError {
    AppError::parse(format!("Raw dump line {}: {}", line_no, message))
}

fn parse_header(line: &str, line_no: usize) -> Result<()> {
    let version = line
        .strip_prefix(HEADER_PREFIX)
        .ok_or_else(|| line_error(line_no, format!("expected '{}', found '{}'", RAW_DUMP_HEADER, line)))?;

    match version.trim().parse::<u32>() {
        Ok(RAW_DUMP_VERSION) => Ok(()),
        Ok(other) => Err(line_error(line_no, format!("unsupported dump version {}", other))),
        Err(_) => Err(line_error(line_no, format!("invalid dump version '{}'", version))),
    }
}

fn parse_record(line: &str, line_no: usize) -> Result<Sample> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 4 {
        return Err(line_error(line_no, format!("expected 4 fields, found {}", fields.len())));
    }

    let sequence_number = fields[0]
        .parse::<u64>()
        .map_err(|_| line_error(line_no, format!("invalid sequence number '{}'", fields[0])))?;
    if sequence_number == 0 {
        return Err(line_error(line_no, "sequence numbers start at 1".to_string()));
    }

    let latency = |column: usize, name: &str| -> Result<f64> {
        let value = fields[column]
            .parse::<f64>()
            .map_err(|_| line_error(line_no, format!("invalid {} latency '{}'", name, fields[column])))?;
        if !value.is_finite() {
            return Err(line_error(line_no, format!("non-finite {} latency '{}'", name, fields[column])));
        }
        Ok(value)
    };

    Ok(Sample::new(
        sequence_number,
        latency(1, "HTTP")?,
        latency(2, "DNS")?,
        latency(3, "TCP")?,
    ))
}
