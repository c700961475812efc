//! Regular-Wave Response Models
//!
//! Synthesizes the kind of channel a seakeeping solver writes for a ship in
//! regular waves: a steady oscillation about a mean level, reached through a
//! start-up transient, with optional slow drift and measurement noise.
//!
//! ## Response Effects
//!
//! ```text
//!   x(t) = M·(1 - e^(-t/τm))                        mean build-up
//!        + A·(1 + k·e^(-t/τa))·sin(ωe·t + φ)        decaying overshoot
//!        + d·t                                      drift
//!        + n(t)                                     Gaussian noise
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use seakeep_sim::response::{RegularResponse, ResponseConfig, ResponseModel};
//!
//! let config = ResponseConfig {
//!     model: ResponseModel::Transient,
//!     mean: 120.0,
//!     amplitude: 35.0,
//!     period: 8.0,
//!     ..Default::default()
//! };
//!
//! let mut response = RegularResponse::with_seed(config, 7);
//! let series = response.generate().unwrap();
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use seakeep_core::types::{ProcessError, ProcessResult, TimeSeries};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Response model type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseModel {
    /// Pure steady oscillation from t = 0
    Ideal,
    /// Steady oscillation reached through a start-up transient
    #[default]
    Transient,
    /// Transient plus Gaussian noise
    TransientWithNoise,
}

impl ResponseModel {
    /// Parse model from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ideal" | "steady" => Some(ResponseModel::Ideal),
            "transient" => Some(ResponseModel::Transient),
            "noisy" | "transient-noise" => Some(ResponseModel::TransientWithNoise),
            _ => None,
        }
    }
}

/// Regular-wave response configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    pub model: ResponseModel,
    /// Steady mean level
    pub mean: f64,
    /// Steady oscillation amplitude
    pub amplitude: f64,
    /// Oscillation (encounter) period in seconds
    pub period: f64,
    /// Phase of the oscillation in radians
    pub phase: f64,
    /// Extra relative amplitude at t = 0 (`k`)
    pub overshoot: f64,
    /// Mean build-up time constant, in periods
    pub mean_time_constant: f64,
    /// Overshoot decay time constant, in periods
    pub amplitude_time_constant: f64,
    /// Linear drift per second
    pub drift: f64,
    /// Noise standard deviation
    pub noise_std: f64,
    /// Record length in periods
    pub duration_periods: f64,
    /// Samples per period
    pub samples_per_period: usize,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            model: ResponseModel::Transient,
            mean: 0.0,
            amplitude: 1.0,
            period: 10.0,
            phase: PI,
            overshoot: 1.0,
            mean_time_constant: 1.5,
            amplitude_time_constant: 2.0,
            drift: 0.0,
            noise_std: 0.0,
            duration_periods: 40.0,
            samples_per_period: 100,
        }
    }
}

impl ResponseConfig {
    /// Steady oscillation without transient or noise
    pub fn steady(mean: f64, amplitude: f64, period: f64) -> Self {
        Self {
            model: ResponseModel::Ideal,
            mean,
            amplitude,
            period,
            ..Default::default()
        }
    }

    /// Transient response with additive noise
    pub fn with_noise(mean: f64, amplitude: f64, period: f64, noise_std: f64) -> Self {
        Self {
            model: ResponseModel::TransientWithNoise,
            mean,
            amplitude,
            period,
            noise_std,
            ..Default::default()
        }
    }

    /// Sample interval in seconds
    pub fn dt(&self) -> f64 {
        self.period / self.samples_per_period.max(1) as f64
    }

    /// Number of samples in the record
    pub fn num_samples(&self) -> usize {
        (self.duration_periods * self.samples_per_period as f64).round() as usize
    }

    fn validate(&self) -> ProcessResult<()> {
        if !(self.period > 0.0) {
            return Err(ProcessError::InvalidParameter(format!(
                "response period must be positive, got {}",
                self.period
            )));
        }
        if self.samples_per_period < 2 {
            return Err(ProcessError::InvalidParameter(
                "need at least 2 samples per period".to_string(),
            ));
        }
        Ok(())
    }
}

/// Regular-wave response generator
#[derive(Debug)]
pub struct RegularResponse {
    config: ResponseConfig,
    rng: StdRng,
}

impl RegularResponse {
    /// Create a generator with an entropy-seeded noise source
    pub fn new(config: ResponseConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create with specific seed for reproducibility
    pub fn with_seed(config: ResponseConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Noise-free response at time `t`
    pub fn clean_value(&self, t: f64) -> f64 {
        let c = &self.config;
        let omega = 2.0 * PI / c.period;
        let oscillation = c.amplitude * (omega * t + c.phase).sin();

        match c.model {
            ResponseModel::Ideal => c.mean + oscillation,
            ResponseModel::Transient | ResponseModel::TransientWithNoise => {
                let tau_m = c.mean_time_constant * c.period;
                let tau_a = c.amplitude_time_constant * c.period;
                let build_up = if tau_m > 0.0 { 1.0 - (-t / tau_m).exp() } else { 1.0 };
                let envelope = if tau_a > 0.0 {
                    1.0 + c.overshoot * (-t / tau_a).exp()
                } else {
                    1.0
                };
                c.mean * build_up + envelope * oscillation + c.drift * t
            }
        }
    }

    /// Generate the full record
    pub fn generate(&mut self) -> ProcessResult<TimeSeries> {
        self.config.validate()?;
        let dt = self.config.dt();
        let time: Vec<f64> = (0..self.config.num_samples()).map(|i| i as f64 * dt).collect();
        let clean: Vec<f64> = time.iter().map(|&t| self.clean_value(t)).collect();

        let values = match self.config.model {
            ResponseModel::TransientWithNoise => self.apply_noise(&clean)?,
            _ => clean,
        };
        TimeSeries::new(time, values)
    }

    /// Add zero-mean Gaussian noise
    pub fn apply_noise(&mut self, values: &[f64]) -> ProcessResult<Vec<f64>> {
        if self.config.noise_std == 0.0 {
            return Ok(values.to_vec());
        }
        let noise = Normal::new(0.0, self.config.noise_std)
            .map_err(|e| ProcessError::InvalidParameter(format!("noise level: {}", e)))?;
        Ok(values
            .iter()
            .map(|&v| v + noise.sample(&mut self.rng))
            .collect())
    }
}
