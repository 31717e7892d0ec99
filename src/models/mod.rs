//! Data models and structures for the latency sampler

pub mod config;
pub mod sample;

// Re-export main model types
pub use config::Config;
pub use sample::{ProbeTarget, Sample, SampleSequence, BROWSER_HEADERS};
