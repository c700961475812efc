//! Wave Spectra
//!
//! Two-parameter (ITTC) wave elevation spectrum:
//!
//! ```text
//!   S(ω) = 5/16 · Hs² · ωp⁴ · ω⁻⁵ · exp(-5/4 · (ωp/ω)⁴),   ωp = 2π / Tp
//! ```
//!
//! `S` is 0 for `ω <= 0` and any non-finite value is reported as 0.

use crate::config::SeaStateConfig;
use crate::types::{ProcessError, ProcessResult};
use std::f64::consts::PI;

/// One-sided wave elevation spectrum
pub trait WaveSpectrum {
    /// Spectral density at absolute frequency `omega` (m²·s/rad)
    fn density(&self, omega: f64) -> f64;

    fn significant_height(&self) -> f64;

    /// Zeroth moment implied by the significant height, `Hs²/16`
    fn m0_theory(&self) -> f64 {
        let hs = self.significant_height();
        hs * hs / 16.0
    }
}

/// ITTC two-parameter spectrum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IttcSpectrum {
    /// Significant wave height in metres
    pub hs: f64,
    /// Modal (peak) period in seconds
    pub tp: f64,
}

impl IttcSpectrum {
    pub fn new(hs: f64, tp: f64) -> ProcessResult<Self> {
        if !(hs >= 0.0 && hs.is_finite()) {
            return Err(ProcessError::InvalidParameter(format!(
                "significant wave height must be non-negative, got {}",
                hs
            )));
        }
        if !(tp > 0.0 && tp.is_finite()) {
            return Err(ProcessError::InvalidParameter(format!(
                "modal period must be positive, got {}",
                tp
            )));
        }
        Ok(Self { hs, tp })
    }

    /// Build from a sea state, converting Tz to Tp when needed
    pub fn from_sea_state(sea: &SeaStateConfig) -> ProcessResult<Self> {
        Self::new(sea.significant_height, sea.peak_period())
    }

    /// Modal angular frequency `2π / Tp`
    pub fn modal_frequency(&self) -> f64 {
        2.0 * PI / self.tp
    }
}

impl WaveSpectrum for IttcSpectrum {
    fn density(&self, omega: f64) -> f64 {
        if omega <= 0.0 {
            return 0.0;
        }
        let wp = self.modal_frequency();
        let s = (5.0 / 16.0)
            * self.hs.powi(2)
            * wp.powi(4)
            * omega.powi(-5)
            * (-(5.0 / 4.0) * (wp / omega).powi(4)).exp();
        if s.is_finite() {
            s
        } else {
            0.0
        }
    }

    fn significant_height(&self) -> f64 {
        self.hs
    }
}
