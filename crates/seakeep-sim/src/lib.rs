//! # Seakeep Synthetic Data
//!
//! Generates seakeeping time histories with known steady values so the
//! extraction and aggregation pipeline can be exercised without a solver.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌────────────────┐
//! │  ShipModel   │───▶│ RegularResponse  │───▶│ HistoryWriter  │───▶ *.txt
//! │ transfer fns │    │ transient, drift │    │ solver layout  │
//! └──────────────┘    │ Gaussian noise   │    └────────────────┘
//!                     └──────────────────┘
//!
//! IttcSpectrum ───▶ IrregularSea (random-phase sum of sinusoids)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seakeep_sim::prelude::*;
//!
//! let run = SyntheticRun::new(RunKind::Motion, 0.45, ShipModel::default());
//! std::fs::write(run.file_name(), run.to_text(42)?)?;
//! ```

pub mod history;
pub mod irregular;
pub mod response;
pub mod scenario;

// Re-exports
pub use history::HistoryWriter;
pub use irregular::{IrregularSea, WaveComponent};
pub use response::{RegularResponse, ResponseConfig, ResponseModel};
pub use scenario::{RunKind, ShipModel, SyntheticRun};
pub use seakeep_core::ingest::WAVE_HEIGHT_LABEL;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::history::HistoryWriter;
    pub use crate::response::{RegularResponse, ResponseConfig, ResponseModel};
    pub use crate::scenario::{RunKind, ShipModel, SyntheticRun};
}
