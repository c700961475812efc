//! Irregular Sea Elevation
//!
//! Random-phase sum-of-sinusoids realisation of a wave spectrum:
//!
//! ```text
//!   η(t) = Σ a_n · cos(ω_n·t + φ_n),   a_n = sqrt(2·S(ω_n)·Δω)
//! ```
//!
//! with `φ_n` uniform on `[0, 2π)`. The variance of `η` equals the discrete
//! moment `Σ S(ω_n)·Δω`, so a record from a fine, wide grid has a significant
//! height close to the spectrum's `Hs`.
//!
//! An observer moving through the field sees each component at its encounter
//! frequency; [`IrregularSea::with_encounter`] switches the time argument to
//! `ωe`.
//!
//! ## Usage
//!
//! ```rust
//! use seakeep_core::spectral::IttcSpectrum;
//! use seakeep_sim::irregular::IrregularSea;
//!
//! let spectrum = IttcSpectrum::new(5.5, 9.0).unwrap();
//! let sea = IrregularSea::with_seed(&spectrum, 0.2, 2.0, 200, 3);
//! let elevation = sea.generate(0.5, 7200).unwrap();
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seakeep_core::spectral::{EncounterMapping, WaveSpectrum};
use seakeep_core::types::{ProcessResult, TimeSeries};
use std::f64::consts::PI;

/// One sinusoidal wave component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveComponent {
    /// Absolute frequency in rad/s
    pub omega: f64,
    /// Frequency seen by the observer in rad/s
    pub omega_seen: f64,
    pub amplitude: f64,
    /// Phase in radians
    pub phase: f64,
}

/// Sum-of-sinusoids sea surface
#[derive(Debug, Clone)]
pub struct IrregularSea {
    components: Vec<WaveComponent>,
}

impl IrregularSea {
    /// Create with entropy-seeded phases
    pub fn new<S: WaveSpectrum>(spectrum: &S, omega_min: f64, omega_max: f64, n: usize) -> Self {
        Self::build(spectrum, omega_min, omega_max, n, &mut StdRng::from_entropy())
    }

    /// Create with specific seed for reproducibility
    pub fn with_seed<S: WaveSpectrum>(
        spectrum: &S,
        omega_min: f64,
        omega_max: f64,
        n: usize,
        seed: u64,
    ) -> Self {
        Self::build(spectrum, omega_min, omega_max, n, &mut StdRng::seed_from_u64(seed))
    }

    fn build<S: WaveSpectrum>(
        spectrum: &S,
        omega_min: f64,
        omega_max: f64,
        n: usize,
        rng: &mut StdRng,
    ) -> Self {
        let n = n.max(1);
        let d_omega = (omega_max - omega_min).max(0.0) / n as f64;

        // Midpoint frequencies of n equal bands
        let components = (0..n)
            .map(|i| {
                let omega = omega_min + (i as f64 + 0.5) * d_omega;
                WaveComponent {
                    omega,
                    omega_seen: omega,
                    amplitude: (2.0 * spectrum.density(omega) * d_omega).sqrt(),
                    phase: rng.gen::<f64>() * 2.0 * PI,
                }
            })
            .collect();

        Self { components }
    }

    /// Observe the field from a moving ship
    pub fn with_encounter(mut self, mapping: &EncounterMapping) -> Self {
        for c in &mut self.components {
            c.omega_seen = mapping.encounter_frequency(c.omega);
        }
        self
    }

    pub fn components(&self) -> &[WaveComponent] {
        &self.components
    }

    /// Variance of the realisation, `Σ a²/2`
    pub fn variance(&self) -> f64 {
        self.components.iter().map(|c| c.amplitude * c.amplitude / 2.0).sum()
    }

    /// Elevation at time `t`
    pub fn elevation(&self, t: f64) -> f64 {
        self.components
            .iter()
            .map(|c| c.amplitude * (c.omega_seen * t + c.phase).cos())
            .sum()
    }

    /// Sample `num_samples` points at interval `dt`
    pub fn generate(&self, dt: f64, num_samples: usize) -> ProcessResult<TimeSeries> {
        let time: Vec<f64> = (0..num_samples).map(|i| i as f64 * dt).collect();
        let values = time.iter().map(|&t| self.elevation(t)).collect();
        TimeSeries::new(time, values)
    }
}
