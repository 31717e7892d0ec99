//! Summary statistics and plot downsampling for latency series

use crate::{
    models::SampleSequence,
    types::Phase,
};
use serde::{Deserialize, Serialize};

/// Minimum, maximum and mean of one phase's latencies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of samples summarised
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Samples averaged into each plotted point
    pub requests_per_point: usize,
}

impl SeriesSummary {
    /// Summarise `values`; `None` when there is nothing to summarise
    pub fn from_values(values: &[f64], cap: usize) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count: values.len(),
            min,
            max,
            mean: mean(values),
            requests_per_point: requests_per_point(values.len(), cap),
        })
    }
}

/// Per-phase summaries of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_samples: usize,
    pub http: Option<SeriesSummary>,
    pub dns: Option<SeriesSummary>,
    pub tcp: Option<SeriesSummary>,
    /// Samples whose derived HTTP latency came out below zero
    pub negative_http_samples: usize,
}

impl RunSummary {
    pub fn from_samples(samples: &SampleSequence, cap: usize) -> Self {
        let summarise = |phase| SeriesSummary::from_values(&samples.values(phase), cap);

        Self {
            total_samples: samples.len(),
            http: summarise(Phase::Http),
            dns: summarise(Phase::Dns),
            tcp: summarise(Phase::Tcp),
            negative_http_samples: samples.iter().filter(|s| s.http_latency_ms < 0.0).count(),
        }
    }

    /// Summary for a single phase
    pub fn phase(&self, phase: Phase) -> Option<&SeriesSummary> {
        match phase {
            Phase::Http => self.http.as_ref(),
            Phase::Dns => self.dns.as_ref(),
            Phase::Tcp => self.tcp.as_ref(),
        }
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bucket size used when `count` samples are plotted under `cap`
pub fn requests_per_point(count: usize, cap: usize) -> usize {
    if cap == 0 || count <= cap {
        1
    } else {
        count / cap
    }
}

/// Reduce a series for plotting by bucketed averaging.
///
/// Series at or below `cap` are returned unchanged. Longer series are cut into
/// consecutive buckets of `floor(len / cap)` points; each bucket becomes one
/// point at the mean of its x and y values. A trailing partial bucket is kept,
/// so the result may hold more than `cap` points.
pub fn downsample(points: &[(f64, f64)], cap: usize) -> Vec<(f64, f64)> {
    let bucket = requests_per_point(points.len(), cap);
    if bucket <= 1 {
        return points.to_vec();
    }

    points
        .chunks(bucket)
        .map(|chunk| {
            let n = chunk.len() as f64;
            let x = chunk.iter().map(|(x, _)| x).sum::<f64>() / n;
            let y = chunk.iter().map(|(_, y)| y).sum::<f64>() / n;
            (x, y)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;
    use proptest::prelude::*;

    #[test]
    fn test_downsample_120_with_cap_50() {
        let points: Vec<(f64, f64)> = (1..=120).map(|i| (i as f64, i as f64 * 10.0)).collect();

        let reduced = downsample(&points, 50);

        assert_eq!(requests_per_point(120, 50), 2);
        assert_eq!(reduced.len(), 60);
        assert_eq!(reduced[0], (1.5, 15.0));
        assert_eq!(reduced[59], (119.5, 1195.0));
    }

    #[test]
    fn test_downsample_keeps_partial_bucket() {
        let points: Vec<(f64, f64)> = (1..=7).map(|i| (i as f64, 1.0)).collect();

        let reduced = downsample(&points, 3);

        // bucket size 2: [1,2] [3,4] [5,6] [7]
        assert_eq!(reduced, vec![(1.5, 1.0), (3.5, 1.0), (5.5, 1.0), (7.0, 1.0)]);
    }

    #[test]
    fn test_downsample_below_cap_unchanged() {
        let points = vec![(1.0, 3.0), (4.0, 9.0)];
        assert_eq!(downsample(&points, 50), points);
        assert_eq!(downsample(&points, 2), points);
        assert!(downsample(&[], 50).is_empty());
    }

    #[test]
    fn test_series_summary() {
        let summary = SeriesSummary::from_values(&[7.0, -2.0, 10.0, 5.0], 50).unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.min, -2.0);
        assert_eq!(summary.max, 10.0);
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.requests_per_point, 1);

        assert!(SeriesSummary::from_values(&[], 50).is_none());
    }

    #[test]
    fn test_run_summary_counts_negative_http() {
        let samples = SampleSequence::from_samples(vec![
            Sample::new(1, 7.0, 5.0, 8.0),
            Sample::new(3, -1.5, 12.0, 9.0),
        ])
        .unwrap();

        let summary = RunSummary::from_samples(&samples, 50);

        assert_eq!(summary.total_samples, 2);
        assert_eq!(summary.negative_http_samples, 1);
        assert_eq!(summary.phase(Phase::Dns).unwrap().max, 12.0);
        assert_eq!(summary.phase(Phase::Tcp).unwrap().mean, 8.5);
    }

    #[test]
    fn test_run_summary_empty() {
        let summary = RunSummary::from_samples(&SampleSequence::new(), 50);
        assert_eq!(summary.total_samples, 0);
        assert!(summary.http.is_none());
    }

    proptest! {
        #[test]
        fn prop_downsample_size_and_bounds(len in 0usize..500, cap in 1usize..80) {
            let points: Vec<(f64, f64)> = (0..len).map(|i| (i as f64 + 1.0, (i % 13) as f64)).collect();
            let reduced = downsample(&points, cap);

            let bucket = requests_per_point(len, cap);
            prop_assert_eq!(reduced.len(), (len + bucket - 1) / bucket);

            for (x, y) in reduced {
                prop_assert!(x >= 1.0 && x <= len as f64);
                prop_assert!(y >= 0.0 && y <= 12.0);
            }
        }
    }
}
