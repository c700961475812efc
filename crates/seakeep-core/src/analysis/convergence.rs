//! Convergence Detection
//!
//! Finds the cycle from which the per-cycle mean and amplitude have settled,
//! and reduces that converged tail to a single (mean, amplitude) pair.
//!
//! ## Scan policy
//!
//! For each candidate start `s = 0 ..= N - min_converged_cycles` the tail
//! `[s, N)` is scored with a relative stability ratio
//!
//! ```text
//! R = RMS(first differences of tail) / RMS(tail)
//! ```
//!
//! for both the means and the amplitudes. The first `s` where both ratios are
//! within tolerance wins, so the longest stable tail is preferred. When no
//! candidate passes, the last `min_converged_cycles` cycles are used.
//!
//! ## Fixed-window policy
//!
//! Always averages the last `K` cycles without any search.

use super::statistics::stability_ratio;
use crate::config::{ConvergenceConfig, TailPolicy};
use crate::types::{mean, ProcessError, ProcessResult};
use serde::Serialize;
use tracing::debug;

/// Converged tail of a cycle sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceResult {
    /// Zero-based index of the first cycle in the converged tail
    pub start_index: usize,
    pub converged_mean: f64,
    pub converged_amplitude: f64,
    /// Number of cycles the detector was given
    pub total_cycles: usize,
    /// Policy that produced this result
    pub policy: TailPolicy,
    /// False when the scan found no stable tail and fell back
    pub accepted: bool,
}

impl ConvergenceResult {
    /// 1-based number of the first converged cycle
    pub fn start_cycle(&self) -> usize {
        self.start_index + 1
    }

    /// Number of cycles averaged
    pub fn tail_len(&self) -> usize {
        self.total_cycles.saturating_sub(self.start_index)
    }
}

/// Convergence detector
#[derive(Debug, Clone, Default)]
pub struct ConvergenceDetector {
    config: ConvergenceConfig,
}

impl ConvergenceDetector {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// Run the configured tail policy
    pub fn detect(&self, means: &[f64], amplitudes: &[f64]) -> ProcessResult<ConvergenceResult> {
        if means.len() != amplitudes.len() {
            return Err(ProcessError::LengthMismatch {
                time: means.len(),
                values: amplitudes.len(),
            });
        }
        if means.is_empty() {
            return Err(ProcessError::NoQualifyingCycles {
                candidates: 0,
                min_points: 0,
            });
        }

        let window = match self.config.tail_policy {
            TailPolicy::Scan => self.config.min_converged_cycles,
            TailPolicy::FixedWindow { cycles } => cycles,
        };
        if window == 0 {
            return Err(ProcessError::InvalidParameter(format!(
                "{:?} needs a tail window of at least one cycle",
                self.config.tail_policy
            )));
        }

        let result = match self.config.tail_policy {
            TailPolicy::Scan => scan(
                means,
                amplitudes,
                self.config.min_converged_cycles,
                self.config.tol_mean_rel,
                self.config.tol_amp_rel,
            ),
            TailPolicy::FixedWindow { cycles } => fixed_window(means, amplitudes, cycles),
        };

        debug!(
            "Converged from cycle {} of {} (mean {:.6e}, amplitude {:.6e}, accepted {})",
            result.start_cycle(),
            result.total_cycles,
            result.converged_mean,
            result.converged_amplitude,
            result.accepted
        );

        Ok(result)
    }
}

/// Run the tail policy named by `config` without building a detector
pub fn detect_with(
    config: &ConvergenceConfig,
    means: &[f64],
    amplitudes: &[f64],
) -> ProcessResult<ConvergenceResult> {
    ConvergenceDetector::new(config.clone()).detect(means, amplitudes)
}

/// Longest-stable-tail search
pub fn scan(
    means: &[f64],
    amplitudes: &[f64],
    min_converged_cycles: usize,
    tol_mean_rel: f64,
    tol_amp_rel: f64,
) -> ConvergenceResult {
    let n = means.len();
    if n < min_converged_cycles + 1 {
        return ConvergenceResult {
            start_index: 0,
            converged_mean: mean(means),
            converged_amplitude: mean(amplitudes),
            total_cycles: n,
            policy: TailPolicy::Scan,
            accepted: false,
        };
    }

    let mut accepted = None;
    for start in 0..=(n - min_converged_cycles) {
        if n - start < 2 {
            break;
        }
        let (Some(r_mean), Some(r_amp)) = (
            stability_ratio(&means[start..]),
            stability_ratio(&amplitudes[start..]),
        ) else {
            continue;
        };
        if r_mean <= tol_mean_rel && r_amp <= tol_amp_rel {
            accepted = Some(start);
            break;
        }
    }

    let start_index = accepted.unwrap_or(n.saturating_sub(min_converged_cycles));
    ConvergenceResult {
        start_index,
        converged_mean: mean(&means[start_index..]),
        converged_amplitude: mean(&amplitudes[start_index..]),
        total_cycles: n,
        policy: TailPolicy::Scan,
        accepted: accepted.is_some(),
    }
}

/// Average of the last `cycles` cycles (or all of them when there are fewer)
pub fn fixed_window(means: &[f64], amplitudes: &[f64], cycles: usize) -> ConvergenceResult {
    let n = means.len();
    let take = cycles.min(n);
    let start_index = n - take;
    ConvergenceResult {
        start_index,
        converged_mean: mean(&means[start_index..]),
        converged_amplitude: mean(&amplitudes[start_index..]),
        total_cycles: n,
        policy: TailPolicy::FixedWindow { cycles },
        accepted: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_tail_detected() {
        let mut means = vec![5.0, 4.0, 3.0, 2.0];
        means.extend(std::iter::repeat(1.0).take(16));
        let mut amps = vec![0.2, 0.4, 0.6, 0.8];
        amps.extend(std::iter::repeat(0.9).take(16));

        let result = scan(&means, &amps, 8, 0.02, 0.02);
        assert!(result.start_index <= 4, "start {}", result.start_index);
        assert!(result.accepted);
        assert_relative_eq!(result.converged_mean, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.converged_amplitude, 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_cycles_returns_plain_average() {
        let means = [1.0, 2.0, 3.0, 4.0];
        let amps = [2.0, 2.0, 4.0, 4.0];
        let result = scan(&means, &amps, 8, 0.02, 0.02);
        assert_eq!(result.start_index, 0);
        assert!(!result.accepted);
        assert_relative_eq!(result.converged_mean, 2.5);
        assert_relative_eq!(result.converged_amplitude, 3.0);
    }

    #[test]
    fn test_fallback_uses_last_window() {
        // Alternating values never settle
        let means: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 1.0 } else { 2.0 }).collect();
        let amps = vec![1.0; 12];
        let result = scan(&means, &amps, 5, 0.01, 0.01);
        assert!(!result.accepted);
        assert_eq!(result.start_index, 7);
        assert_eq!(result.tail_len(), 5);
        assert_relative_eq!(result.converged_mean, 1.6);
    }

    #[test]
    fn test_zero_rms_candidates_are_skipped() {
        // Means are all zero: every candidate is skipped and the scan falls back
        let means = vec![0.0; 10];
        let amps = vec![1.0; 10];
        let result = scan(&means, &amps, 4, 0.02, 0.02);
        assert!(!result.accepted);
        assert_eq!(result.start_index, 6);
        assert_eq!(result.converged_mean, 0.0);
    }

    #[test]
    fn test_slow_decay_prefers_longest_passing_tail() {
        // Geometric settling towards 10
        let means: Vec<f64> = (0..30).map(|i| 10.0 + 5.0 * 0.5f64.powi(i)).collect();
        let amps: Vec<f64> = (0..30).map(|i| 2.0 - 0.5f64.powi(i)).collect();
        let result = scan(&means, &amps, 5, 0.005, 0.005);
        assert!(result.accepted);

        // The tail must pass and the one before it must not
        let s = result.start_index;
        assert!(stability_ratio(&means[s..]).unwrap() <= 0.005);
        assert!(stability_ratio(&amps[s..]).unwrap() <= 0.005);
        let earlier = s - 1;
        let fails = stability_ratio(&means[earlier..]).unwrap() > 0.005
            || stability_ratio(&amps[earlier..]).unwrap() > 0.005;
        assert!(fails);
    }

    #[test]
    fn test_fixed_window() {
        let means: Vec<f64> = (1..=15).map(|i| i as f64).collect();
        let amps = vec![0.5; 15];
        let result = fixed_window(&means, &amps, 10);
        assert_eq!(result.start_index, 5);
        assert_relative_eq!(result.converged_mean, 10.5);
        assert_relative_eq!(result.converged_amplitude, 0.5);

        let short = fixed_window(&means[..3], &amps[..3], 10);
        assert_eq!(short.start_index, 0);
        assert_relative_eq!(short.converged_mean, 2.0);
    }

    #[test]
    fn test_detector_dispatches_on_policy() {
        let means: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let amps = vec![1.0; 12];
        let detector = ConvergenceDetector::new(ConvergenceConfig {
            tail_policy: TailPolicy::FixedWindow { cycles: 4 },
            ..Default::default()
        });
        let result = detector.detect(&means, &amps).unwrap();
        assert_eq!(result.start_index, 8);
        assert_eq!(result.policy, TailPolicy::FixedWindow { cycles: 4 });
    }

    #[test]
    fn test_detector_rejects_empty_input() {
        let detector = ConvergenceDetector::default();
        assert!(detector.detect(&[], &[]).is_err());
        assert!(detector.detect(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_detector_rejects_empty_fixed_window() {
        let detector = ConvergenceDetector::new(ConvergenceConfig {
            tail_policy: TailPolicy::from_str("fixed:0").unwrap(),
            ..Default::default()
        });
        let err = detector.detect(&[1.0, 2.0, 3.0], &[0.5, 0.5, 0.5]).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidParameter(_)));
    }

    #[test]
    fn test_detector_rejects_zero_min_converged_cycles() {
        let means: Vec<f64> = (0..6).map(|i| if i % 2 == 0 { 1.0 } else { 2.0 }).collect();
        let amps = vec![1.0; 6];
        let config = ConvergenceConfig {
            min_converged_cycles: 0,
            tail_policy: TailPolicy::Scan,
            ..Default::default()
        };
        let err = detect_with(&config, &means, &amps).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidParameter(_)));
    }
}
