//! Synthetic Seakeeping Runs
//!
//! One run is one regular-wave simulation at a single wave frequency. The
//! expected steady values come from smooth analytic transfer functions of the
//! wavelength ratio `λ/L`, so a batch over several frequencies produces a
//! plausible RAO curve whose true values are known.
//!
//! Two file layouts are produced:
//!
//! | kind       | columns after time                          |
//! |------------|---------------------------------------------|
//! | Resistance | 1: added resistance                         |
//! | Motion     | 1: surge, 2: sway, 3: heave, 4: roll, 5: pitch |

use crate::history::HistoryWriter;
use crate::response::{RegularResponse, ResponseConfig, ResponseModel};
use seakeep_core::analysis::wave_length_ratio;
use seakeep_core::spectral::EncounterMapping;
use seakeep_core::types::{ProcessError, ProcessResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Kind of solver output to imitate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunKind {
    #[default]
    Resistance,
    Motion,
}

impl RunKind {
    /// Parse kind from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "resistance" | "res" => Some(RunKind::Resistance),
            "motion" | "mot" => Some(RunKind::Motion),
            _ => None,
        }
    }

    fn file_prefix(&self) -> &'static str {
        match self {
            RunKind::Resistance => "船舶波浪增阻时间历程",
            RunKind::Motion => "船舶运动时间历程",
        }
    }

    fn column_names(&self) -> &'static [&'static str] {
        match self {
            RunKind::Resistance => &["resistance"],
            RunKind::Motion => &["surge", "sway", "heave", "roll", "pitch"],
        }
    }
}

/// Ship and sea parameters shared by every run of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipModel {
    /// Reference length in metres
    pub length: f64,
    /// Forward speed in m/s
    pub speed_ms: f64,
    pub heading_deg: f64,
    /// Regular wave height in metres
    pub wave_height: f64,
    /// Peak mean added resistance
    pub peak_resistance: f64,
    /// Peak pitch RAO in degrees per metre of amplitude
    pub peak_pitch: f64,
    pub response_model: ResponseModel,
    pub noise_std: f64,
}

impl Default for ShipModel {
    fn default() -> Self {
        Self {
            length: 325.5,
            speed_ms: 7.7,
            heading_deg: 180.0,
            wave_height: 2.0,
            peak_resistance: 250.0,
            peak_pitch: 0.6,
            response_model: ResponseModel::Transient,
            noise_std: 0.0,
        }
    }
}

impl ShipModel {
    /// Expected mean added resistance at wave frequency `omega`
    pub fn mean_resistance(&self, omega: f64) -> f64 {
        let ratio = wave_length_ratio(omega, self.length);
        if ratio <= 0.0 {
            return 0.0;
        }
        // Bell curve in ln(λ/L) peaking at λ/L = 1
        let x = ratio.ln() / 0.6;
        self.peak_resistance * (-0.5 * x * x).exp()
    }

    /// Heave RAO (amplitude per wave amplitude)
    pub fn heave_rao(&self, omega: f64) -> f64 {
        let ratio = wave_length_ratio(omega, self.length);
        if ratio <= 0.0 {
            return 0.0;
        }
        1.0 / (1.0 + ratio.powi(-4)).sqrt()
    }

    /// Pitch RAO (degrees per wave amplitude)
    pub fn pitch_rao(&self, omega: f64) -> f64 {
        let ratio = wave_length_ratio(omega, self.length);
        if ratio <= 0.0 {
            return 0.0;
        }
        self.peak_pitch * 2.0 * ratio / (1.0 + ratio * ratio)
    }

    /// Period the ship responds at
    pub fn encounter_period(&self, omega: f64) -> ProcessResult<f64> {
        let mapping = EncounterMapping::new(self.speed_ms, self.heading_deg);
        let omega_e = mapping.encounter_frequency(omega).abs();
        if !(omega_e > 0.0) {
            return Err(ProcessError::InvalidParameter(format!(
                "no encounter oscillation at omega = {}",
                omega
            )));
        }
        Ok(2.0 * PI / omega_e)
    }
}

/// One synthetic run
#[derive(Debug, Clone)]
pub struct SyntheticRun {
    pub kind: RunKind,
    /// Wave frequency in rad/s
    pub omega: f64,
    pub ship: ShipModel,
    pub duration_periods: f64,
    pub samples_per_period: usize,
    /// Every n-th row is written as an overflow row
    pub overflow_every: Option<usize>,
}

impl SyntheticRun {
    pub fn new(kind: RunKind, omega: f64, ship: ShipModel) -> Self {
        Self {
            kind,
            omega,
            ship,
            duration_periods: 40.0,
            samples_per_period: 60,
            overflow_every: None,
        }
    }

    /// Builder: corrupt every `n`-th row
    pub fn with_overflow_every(mut self, n: usize) -> Self {
        self.overflow_every = (n > 0).then_some(n);
        self
    }

    /// File name keyed by the wave frequency, e.g. `船舶运动时间历程_w0.450.txt`
    pub fn file_name(&self) -> String {
        format!("{}_w{:.3}.txt", self.kind.file_prefix(), self.omega)
    }

    fn channel_config(&self, period: f64, mean: f64, amplitude: f64, phase: f64) -> ResponseConfig {
        ResponseConfig {
            model: self.ship.response_model,
            mean,
            amplitude,
            period,
            phase,
            noise_std: self.ship.noise_std,
            duration_periods: self.duration_periods,
            samples_per_period: self.samples_per_period,
            ..Default::default()
        }
    }

    /// Time axis and channel values in file column order
    pub fn generate(&self, seed: u64) -> ProcessResult<(Vec<f64>, Vec<Vec<f64>>)> {
        let period = self.ship.encounter_period(self.omega)?;
        let wave_amplitude = self.ship.wave_height / 2.0;

        let configs = match self.kind {
            RunKind::Resistance => {
                let mean = self.ship.mean_resistance(self.omega);
                vec![self.channel_config(period, mean, 0.4 * mean + 1.0, PI)]
            }
            RunKind::Motion => vec![
                self.channel_config(period, 0.0, 0.05 * wave_amplitude, 0.0),
                self.channel_config(period, 0.0, 0.0, 0.0),
                self.channel_config(period, 0.0, self.ship.heave_rao(self.omega) * wave_amplitude, PI),
                self.channel_config(period, 0.0, 0.0, 0.0),
                self.channel_config(period, 0.0, self.ship.pitch_rao(self.omega) * wave_amplitude, PI / 2.0),
            ],
        };

        let mut time = Vec::new();
        let mut channels = Vec::with_capacity(configs.len());
        for (i, config) in configs.into_iter().enumerate() {
            let series = RegularResponse::with_seed(config, seed.wrapping_add(i as u64)).generate()?;
            if time.is_empty() {
                time = series.time().to_vec();
            }
            channels.push(series.values().to_vec());
        }

        debug!(
            "Synthetic {:?} run at omega {:.3}: period {:.3}s, {} samples",
            self.kind,
            self.omega,
            period,
            time.len()
        );
        Ok((time, channels))
    }

    /// Render the run as a time-history file body
    pub fn to_text(&self, seed: u64) -> ProcessResult<String> {
        let (time, channels) = self.generate(seed)?;
        let refs: Vec<&[f64]> = channels.iter().map(|c| c.as_slice()).collect();

        let title = format!("{} omega={:.4} rad/s (synthetic)", self.kind.file_prefix(), self.omega);
        let mut writer = HistoryWriter::new(&title, self.kind.column_names());
        if self.kind == RunKind::Motion {
            writer = writer.with_wave_height(self.ship.wave_height);
        }
        if let Some(n) = self.overflow_every {
            writer = writer.with_overflow_every(n);
        }
        writer.to_text(&time, &refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use seakeep_core::ingest::last_number;

    #[test]
    fn test_file_name_keys_frequency() {
        let run = SyntheticRun::new(RunKind::Motion, 0.45, ShipModel::default());
        assert_eq!(run.file_name(), "船舶运动时间历程_w0.450.txt");
        let stem = run.file_name().trim_end_matches(".txt").to_string();
        assert_eq!(last_number(&stem), Some(0.45));
    }

    #[test]
    fn test_transfer_functions_shape() {
        let ship = ShipModel::default();
        // λ = L at ω = sqrt(2πg/L)
        let omega_peak = (2.0 * PI * 9.81 / ship.length).sqrt();
        assert_relative_eq!(ship.mean_resistance(omega_peak), ship.peak_resistance, epsilon = 1e-9);
        assert_relative_eq!(ship.pitch_rao(omega_peak), ship.peak_pitch, epsilon = 1e-12);

        // Long waves: heave follows the surface, resistance vanishes
        assert!(ship.heave_rao(0.1) > 0.99);
        assert!(ship.mean_resistance(0.1) < 1.0);
        assert_eq!(ship.heave_rao(0.0), 0.0);
    }

    #[test]
    fn test_motion_run_layout() {
        let run = SyntheticRun::new(RunKind::Motion, 0.4, ShipModel::default());
        let (time, channels) = run.generate(3).unwrap();
        assert_eq!(channels.len(), 5);
        assert!(channels.iter().all(|c| c.len() == time.len()));
        assert!(run.to_text(3).unwrap().contains("有义波高"));
    }

    #[test]
    fn test_encounter_period_head_seas() {
        let ship = ShipModel::default();
        let period = ship.encounter_period(0.5).unwrap();
        assert!(period < 2.0 * PI / 0.5);
    }
}
