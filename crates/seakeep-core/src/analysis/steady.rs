//! Steady-State Analysis
//!
//! Runs the cycle segmenter and the convergence detector on one channel and
//! keeps the intermediate results, so a caller can report the converged pair
//! together with the cycles it came from.
//!
//! ## Example
//!
//! ```rust,no_run
//! use seakeep_core::analysis::SteadyStateAnalyzer;
//! use seakeep_core::config::AnalysisConfig;
//! use seakeep_core::types::TimeSeries;
//!
//! let series = TimeSeries::new(vec![], vec![]).unwrap(); // your channel
//! let analyzer = SteadyStateAnalyzer::new(AnalysisConfig::resistance());
//! let steady = analyzer.analyze(&series).unwrap();
//! println!("mean {:.4}, amplitude {:.4}", steady.mean(), steady.amplitude());
//! ```

use super::convergence::{ConvergenceDetector, ConvergenceResult};
use super::cycles::{CycleSegmenter, CycleSet};
use super::statistics::ChannelStats;
use crate::config::AnalysisConfig;
use crate::types::{ProcessResult, TimeSeries, GRAVITY};
use serde::Serialize;
use std::f64::consts::PI;
use tracing::debug;

/// Wave heights at or below this are treated as missing when forming RAOs
const MIN_WAVE_HEIGHT: f64 = 0.001;

/// Converged response of one channel
#[derive(Debug, Clone, Serialize)]
pub struct SteadyState {
    pub signal: ChannelStats,
    pub cycles: CycleSet,
    pub convergence: ConvergenceResult,
}

impl SteadyState {
    pub fn mean(&self) -> f64 {
        self.convergence.converged_mean
    }

    pub fn amplitude(&self) -> f64 {
        self.convergence.converged_amplitude
    }

    /// Start time of the first converged cycle
    pub fn start_time(&self) -> Option<f64> {
        self.cycles
            .cycles
            .get(self.convergence.start_index)
            .map(|c| c.start)
    }

    pub fn estimated_period(&self) -> Option<f64> {
        self.cycles.estimated_period()
    }

    /// Format as text report
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        output.push_str("Steady State\n");
        output.push_str(&"═".repeat(50));
        output.push('\n');
        output.push_str(&format!("Cycles:            {}\n", self.cycles.len()));
        output.push_str(&format!("Reference Level:   {:.6e}\n", self.cycles.level));
        output.push_str(&format!(
            "Converged From:    cycle {}{}\n",
            self.convergence.start_cycle(),
            if self.convergence.accepted { "" } else { " (fallback)" }
        ));
        if let Some(t) = self.start_time() {
            output.push_str(&format!("Start Time:        {:.3} s\n", t));
        }
        output.push_str(&format!("Converged Mean:    {:.6e}\n", self.mean()));
        output.push_str(&format!("Converged Amp:     {:.6e}\n", self.amplitude()));
        if let Some(period) = self.estimated_period() {
            output.push_str(&format!("Period Estimate:   {:.4} s\n", period));
        }
        output.push('\n');
        output.push_str(&self.signal.to_text());
        output
    }
}

/// Segment-then-converge pipeline for a single channel
#[derive(Debug, Clone, Default)]
pub struct SteadyStateAnalyzer {
    segmenter: CycleSegmenter,
    detector: ConvergenceDetector,
}

impl SteadyStateAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            segmenter: CycleSegmenter::new(config.segmenter),
            detector: ConvergenceDetector::new(config.convergence),
        }
    }

    pub fn analyze(&self, series: &TimeSeries) -> ProcessResult<SteadyState> {
        let cycles = self.segmenter.segment(series)?;
        let convergence = self.detector.detect(&cycles.means(), &cycles.amplitudes())?;
        debug!(
            "Steady state: {} cycles, converged from {}",
            cycles.len(),
            convergence.start_cycle()
        );
        Ok(SteadyState {
            signal: ChannelStats::compute(series),
            cycles,
            convergence,
        })
    }
}

/// Deep-water wavelength `2πg/ω²`, 0 for non-positive frequencies
pub fn wave_length(omega: f64, gravity: f64) -> f64 {
    if omega <= 0.0 {
        return 0.0;
    }
    2.0 * PI * gravity / (omega * omega)
}

/// Wavelength over ship length
pub fn wave_length_ratio(omega: f64, ship_length: f64) -> f64 {
    if ship_length <= 0.0 {
        return 0.0;
    }
    wave_length(omega, GRAVITY) / ship_length
}

/// Response amplitude per unit wave amplitude (`Hs / 2`)
pub fn rao(amplitude: f64, significant_height: f64) -> f64 {
    let hs = if significant_height > MIN_WAVE_HEIGHT {
        significant_height
    } else {
        1.0
    };
    amplitude / (hs / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::statistics::stability_ratio;
    use crate::config::{ReferenceLevel, TailPolicy};
    use approx::assert_relative_eq;

    /// Decaying start-up transient on top of a steady sinusoid
    fn settling_response(mean: f64, amplitude: f64, period: f64) -> TimeSeries {
        let dt = 0.05;
        let n = (40.0 * period / dt) as usize;
        let omega = 2.0 * PI / period;
        let time: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let values = time
            .iter()
            .map(|&t| {
                let envelope = 1.0 + 2.0 * (-t / period).exp();
                mean * (1.0 - (-t / period).exp())
                    - amplitude * envelope * (omega * t).sin()
            })
            .collect();
        TimeSeries::new(time, values).unwrap()
    }

    #[test]
    fn test_analyzer_recovers_steady_pair() {
        let series = settling_response(5.0, 1.2, 8.0);
        let config = AnalysisConfig::resistance();
        let tol = config.convergence.tol_mean_rel;
        let steady = SteadyStateAnalyzer::new(config).analyze(&series).unwrap();

        // The whole record drifts by more than 0.5%, so the transient is skipped
        let means = steady.cycles.means();
        let amps = steady.cycles.amplitudes();
        assert!(stability_ratio(&means).unwrap() > tol);
        let s = steady.convergence.start_index;
        assert!(s > 0, "transient should be skipped");
        if steady.convergence.accepted {
            assert!(stability_ratio(&means[s..]).unwrap() <= tol);
            assert!(stability_ratio(&amps[s..]).unwrap() <= tol);
            let fails = stability_ratio(&means[s - 1..]).unwrap() > tol
                || stability_ratio(&amps[s - 1..]).unwrap() > tol;
            assert!(fails);
        }
        assert!(
            (steady.mean() - 5.0).abs() / 5.0 < 0.03,
            "mean {} != 5.0",
            steady.mean()
        );
        assert!(
            (steady.amplitude() - 1.2).abs() / 1.2 < 0.03,
            "amplitude {} != 1.2",
            steady.amplitude()
        );
        let period = steady.estimated_period().unwrap();
        assert!((period - 8.0).abs() < 0.05, "period {}", period);
        assert!(steady.start_time().unwrap() > 0.0);
    }

    #[test]
    fn test_fixed_window_analysis() {
        let series = settling_response(0.0, 0.8, 10.0);
        let config = AnalysisConfig {
            segmenter: crate::config::SegmenterConfig {
                min_points_per_cycle: 10,
                reference: ReferenceLevel::TailMean { fraction: 0.4 },
            },
            convergence: crate::config::ConvergenceConfig {
                tail_policy: TailPolicy::FixedWindow { cycles: 10 },
                ..Default::default()
            },
        };
        let steady = SteadyStateAnalyzer::new(config).analyze(&series).unwrap();
        assert_eq!(steady.convergence.tail_len(), 10);
        assert!((steady.amplitude() - 0.8).abs() < 0.02);
        assert!(steady.to_text().contains("Converged From"));
    }

    #[test]
    fn test_wave_length() {
        assert_relative_eq!(wave_length(1.0, GRAVITY), 2.0 * PI * 9.81);
        assert_eq!(wave_length(0.0, GRAVITY), 0.0);
        assert_relative_eq!(
            wave_length_ratio(0.5, 325.5),
            2.0 * PI * 9.81 / 0.25 / 325.5
        );
    }

    #[test]
    fn test_rao_falls_back_on_missing_wave_height() {
        assert_relative_eq!(rao(1.5, 3.0), 1.0);
        assert_relative_eq!(rao(1.5, 0.0), 3.0);
        assert_relative_eq!(rao(1.5, 0.0005), 3.0);
    }
}
