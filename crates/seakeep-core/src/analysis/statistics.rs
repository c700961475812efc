//! Channel Statistics
//!
//! RMS helpers used by the convergence test and a whole-record summary of a
//! response channel (extent, mean, RMS, tail level) for reporting alongside
//! the steady-state result.

use crate::types::{mean, TimeSeries};
use serde::Serialize;

/// Root mean square, 0 for an empty slice
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Root mean square of consecutive differences, 0 with fewer than 2 values
pub fn rms_diff(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// `rms_diff / rms`, `None` when the slice has zero RMS
pub fn stability_ratio(values: &[f64]) -> Option<f64> {
    let level = rms(values);
    if level == 0.0 {
        return None;
    }
    Some(rms_diff(values) / level)
}

/// Whole-record statistics of one channel
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    /// Number of samples analyzed
    pub num_samples: usize,
    /// Time span in seconds
    pub duration: f64,
    /// Mean time step in seconds
    pub mean_dt: f64,
    pub mean: f64,
    pub rms: f64,
    pub min: f64,
    pub max: f64,
    /// Mean over the final third of the samples
    pub tail_mean: f64,
}

impl ChannelStats {
    /// Compute statistics for a series
    pub fn compute(series: &TimeSeries) -> Self {
        let values = series.values();
        if values.is_empty() {
            return Self::empty();
        }

        let num_samples = values.len();
        let duration = series.duration();
        let mean_dt = if num_samples > 1 {
            duration / (num_samples - 1) as f64
        } else {
            0.0
        };

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let tail_start = (num_samples * 2) / 3;

        Self {
            num_samples,
            duration,
            mean_dt,
            mean: mean(values),
            rms: rms(values),
            min,
            max,
            tail_mean: mean(&values[tail_start.min(num_samples - 1)..]),
        }
    }

    fn empty() -> Self {
        Self {
            num_samples: 0,
            duration: 0.0,
            mean_dt: 0.0,
            mean: 0.0,
            rms: 0.0,
            min: 0.0,
            max: 0.0,
            tail_mean: 0.0,
        }
    }

    /// Format as text report
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str("Channel Statistics\n");
        output.push_str(&"─".repeat(50));
        output.push('\n');
        output.push_str(&format!("Samples:           {}\n", self.num_samples));
        output.push_str(&format!("Duration:          {:.3} s\n", self.duration));
        output.push_str(&format!("Time Step:         {:.5} s\n", self.mean_dt));
        output.push_str(&format!("Mean:              {:.6e}\n", self.mean));
        output.push_str(&format!("RMS:               {:.6e}\n", self.rms));
        output.push_str(&format!("Range:             [{:.6e}, {:.6e}]\n", self.min, self.max));
        output.push_str(&format!("Tail Mean:         {:.6e}\n", self.tail_mean));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rms_helpers() {
        assert_relative_eq!(rms(&[3.0, 4.0]), 12.5f64.sqrt());
        assert_relative_eq!(rms_diff(&[1.0, 2.0, 4.0]), 2.5f64.sqrt());
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms_diff(&[1.0]), 0.0);
    }

    #[test]
    fn test_stability_ratio() {
        assert_eq!(stability_ratio(&[0.0, 0.0]), None);
        assert_eq!(stability_ratio(&[2.0, 2.0, 2.0]), Some(0.0));
        let r = stability_ratio(&[1.0, 2.0]).unwrap();
        assert_relative_eq!(r, 1.0 / 2.5f64.sqrt());
    }

    #[test]
    fn test_stats_empty() {
        let series = TimeSeries::new(vec![], vec![]).unwrap();
        let stats = ChannelStats::compute(&series);
        assert_eq!(stats.num_samples, 0);
    }

    #[test]
    fn test_stats_ramp() {
        let time: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let values = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = ChannelStats::compute(&TimeSeries::new(time, values).unwrap());

        assert_eq!(stats.num_samples, 6);
        assert_relative_eq!(stats.duration, 2.5);
        assert_relative_eq!(stats.mean_dt, 0.5);
        assert_relative_eq!(stats.mean, 2.5);
        assert_eq!((stats.min, stats.max), (0.0, 5.0));
        assert_relative_eq!(stats.tail_mean, 4.5);
        assert!(stats.to_text().contains("Samples:           6"));
    }
}
