//! Sample, sample sequence and probe target data models

use crate::types::{AppError, Phase, Result};
use serde::{Deserialize, Serialize};

/// Browser-like request headers sent with every probe of a run
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
    ),
    ("Accept-Language", "en-GB,en-US;q=0.9,en;q=0.8"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Upgrade-Insecure-Requests", "1"),
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Safari/537.36",
    ),
    (
        "sec-ch-ua",
        "\"Chromium\";v=\"112\", \"Google Chrome\";v=\"112\", \"Not:A-Brand\";v=\"99\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"macOS\""),
];

/// One validated measurement of the three phases
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 1-based iteration number that produced this sample
    pub sequence_number: u64,

    /// Total request time minus the DNS and TCP phase times
    pub http_latency_ms: f64,

    /// DNS resolution time
    pub dns_latency_ms: f64,

    /// TCP connect time
    pub tcp_latency_ms: f64,
}

impl Sample {
    /// Create a sample from already derived phase latencies
    pub fn new(sequence_number: u64, http_latency_ms: f64, dns_latency_ms: f64, tcp_latency_ms: f64) -> Self {
        Self {
            sequence_number,
            http_latency_ms,
            dns_latency_ms,
            tcp_latency_ms,
        }
    }

    /// Derive a sample from the total request time of an iteration.
    ///
    /// The HTTP latency is `total - (dns + tcp)`. The three values come from
    /// independent round trips, so the result can be negative; it is kept as is.
    pub fn from_total(sequence_number: u64, total_request_ms: f64, dns_latency_ms: f64, tcp_latency_ms: f64) -> Self {
        let http_latency_ms = total_request_ms - (dns_latency_ms + tcp_latency_ms);
        Self::new(sequence_number, http_latency_ms, dns_latency_ms, tcp_latency_ms)
    }

    /// Latency of a single phase
    pub fn latency(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Dns => self.dns_latency_ms,
            Phase::Tcp => self.tcp_latency_ms,
            Phase::Http => self.http_latency_ms,
        }
    }

    /// The `(sequence_number, http, dns, tcp)` tuple consumed by reporting
    pub fn as_tuple(&self) -> (u64, f64, f64, f64) {
        (self.sequence_number, self.http_latency_ms, self.dns_latency_ms, self.tcp_latency_ms)
    }
}

/// Ordered samples of one run; insertion order is iteration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSequence {
    samples: Vec<Sample>,
}

impl SampleSequence {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from samples, checking ordering
    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        let mut sequence = Self::new();
        for sample in samples {
            sequence.push(sample)?;
        }
        Ok(sequence)
    }

    /// Append a sample; sequence numbers must be positive and strictly increasing
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if sample.sequence_number == 0 {
            return Err(AppError::internal("Sample sequence numbers start at 1"));
        }
        if let Some(last) = self.samples.last() {
            if sample.sequence_number <= last.sequence_number {
                return Err(AppError::internal(format!(
                    "Sample {} appended after sample {}",
                    sample.sequence_number, last.sequence_number
                )));
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// `(iteration, latency)` points of one phase, in order
    pub fn series(&self, phase: Phase) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.sequence_number as f64, s.latency(phase)))
            .collect()
    }

    /// Latency values of one phase, in order
    pub fn values(&self, phase: Phase) -> Vec<f64> {
        self.samples.iter().map(|s| s.latency(phase)).collect()
    }
}

impl<'a> IntoIterator for &'a SampleSequence {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// The URL and header set probed for a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    url: String,
    headers: Vec<(String, String)>,
}

impl ProbeTarget {
    /// Target with the standard browser header set
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self::with_headers(
            url,
            BROWSER_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Target with an explicit header set
    pub fn with_headers<S: Into<String>>(url: S, headers: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}
