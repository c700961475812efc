//! Core types for seakeeping signal processing
//!
//! This module defines the sampled time series handed to the cycle segmenter,
//! the physical constants shared by the wave and encounter-frequency code, and
//! the error taxonomy used throughout the library.
//!
//! ## Time Histories
//!
//! A seakeeping simulation writes one row per time step: the simulation time
//! followed by a set of response channels (added resistance, heave, pitch, ...).
//! Each channel is processed on its own as a [`TimeSeries`]:
//!
//! ```text
//!   value
//!     ^        start-up transient      steady state
//!     |      /\                    /\    /\    /\
//!     |  /\ /  \  /\      /\      /  \  /  \  /  \
//!     |-/--v----\/--\----/--\----/----\/----\/----\--> time
//!     |              \/      \/
//! ```

use serde::{Deserialize, Serialize};

/// Gravitational acceleration used for deep-water wavelength (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Standard gravity used by the encounter-frequency relation (m/s²)
pub const STANDARD_GRAVITY: f64 = 9.80665;

/// One knot in metres per second
pub const KNOT_TO_MS: f64 = 0.514_444_444_444_444_5;

/// Result type for processing operations
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Errors that can occur while extracting or aggregating responses
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessError {
    #[error("No numeric rows found in {0}")]
    ParseFailure(String),

    #[error("Found {found} zero up-crossings, at least 2 are needed to form a cycle")]
    InsufficientCrossings { found: usize },

    #[error("None of the {candidates} candidate cycles reached {min_points} samples")]
    NoQualifyingCycles { candidates: usize, min_points: usize },

    #[error("Encounter frequency {omega_enc} rad/s has no positive absolute frequency")]
    UnresolvableFrequency { omega_enc: f64 },

    #[error("Missing required column: {role}")]
    MissingColumn { role: String },

    #[error("Degenerate spectrum: {0}")]
    DegenerateSpectrum(String),

    #[error("Length mismatch: {time} time samples, {values} values")]
    LengthMismatch { time: usize, values: usize },

    #[error("Time decreases at sample {index}")]
    NonMonotonicTime { index: usize },

    #[error("Need at least 2 distinct frequency nodes, got {found}")]
    InsufficientNodes { found: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A single response channel sampled over time
///
/// Time is non-decreasing; the series is not modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    time: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series, checking lengths and time ordering
    pub fn new(time: Vec<f64>, values: Vec<f64>) -> ProcessResult<Self> {
        if time.len() != values.len() {
            return Err(ProcessError::LengthMismatch {
                time: time.len(),
                values: values.len(),
            });
        }
        if let Some(index) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(ProcessError::NonMonotonicTime { index: index + 1 });
        }
        Ok(Self { time, values })
    }

    /// Sample times in seconds
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Sample values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Time span covered by the series
    pub fn duration(&self) -> f64 {
        match (self.time.first(), self.time.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
