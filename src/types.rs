//! Type definitions and aliases

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// A discrete timed network operation within one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Name resolution through the system resolver
    Dns,
    /// TCP connection establishment
    Tcp,
    /// Full HTTP GET, minus the DNS and TCP phase times
    Http,
}

impl Phase {
    /// All phases in probe order
    pub const ALL: [Phase; 3] = [Phase::Dns, Phase::Tcp, Phase::Http];

    /// Short upper-case label used in logs and tables
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Dns => "DNS",
            Phase::Tcp => "TCP",
            Phase::Http => "HTTP",
        }
    }

    /// Chart title for this phase
    pub fn chart_title(&self) -> &'static str {
        match self {
            Phase::Dns => "DNS Response Time",
            Phase::Tcp => "TCP Connection Time",
            Phase::Http => "HTTP Response Latency",
        }
    }

    /// File name stem for this phase's chart
    pub fn file_stem(&self) -> &'static str {
        match self {
            Phase::Dns => "dns_response_time_graph",
            Phase::Tcp => "tcp_response_time_graph",
            Phase::Http => "http_response_time_graph",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a single iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationStatus {
    /// All phases succeeded and the response passed validation
    Accepted,
    /// The request completed but the response was not acceptable
    Rejected,
    /// A phase failed before a response was available
    Failed,
}
