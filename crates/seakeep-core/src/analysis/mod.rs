//! Time-Domain Analysis Module
//!
//! Turns a raw response channel into one converged (mean, amplitude) pair.
//!
//! ## Features
//!
//! - **Cycle Segmentation**: zero up-crossing cycles with per-cycle mean and amplitude
//! - **Convergence Detection**: longest stable tail search or a fixed trailing window
//! - **Channel Statistics**: RMS helpers and whole-record summaries
//! - **Steady-State Pipeline**: segmentation and convergence in one call
//!
//! ## Example
//!
//! ```rust,no_run
//! use seakeep_core::analysis::{CycleSegmenter, ConvergenceDetector};
//! use seakeep_core::types::TimeSeries;
//!
//! let series = TimeSeries::new(vec![], vec![]).unwrap(); // Your channel
//!
//! let cycles = CycleSegmenter::with_min_points(10).segment(&series).unwrap();
//! let result = ConvergenceDetector::default()
//!     .detect(&cycles.means(), &cycles.amplitudes())
//!     .unwrap();
//! println!("Converged mean: {:.4}", result.converged_mean);
//! ```

pub mod convergence;
pub mod cycles;
pub mod statistics;
pub mod steady;

pub use convergence::{detect_with, ConvergenceDetector, ConvergenceResult};
pub use cycles::{up_crossings, Cycle, CycleSegmenter, CycleSet};
pub use statistics::{rms, rms_diff, stability_ratio, ChannelStats};
pub use steady::{rao, wave_length, wave_length_ratio, SteadyState, SteadyStateAnalyzer};
