//! # Seakeep Core
//!
//! Steady-state extraction and spectral aggregation for seakeeping
//! simulation output.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌─────────────────────┐
//! │ time history │──▶│ CycleSegmenter │──▶│ ConvergenceDetector │──▶ (mean, amplitude)
//! │   (ingest)   │   │ up-crossings   │   │ stable tail search  │      per run
//! └──────────────┘   └────────────────┘   └─────────────────────┘
//!                                                                        │
//!              one run per wave frequency ◀──────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │ SpectralAggregator: ITTC spectrum × node weights             │
//! │   absolute reading  ─┐                                       │
//! │   encounter reading ─┴─▶ compare m0η with Hs²/16 ─▶ decision  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seakeep_core::prelude::*;
//!
//! let history = TimeHistoryParser::new(vec![1]).parse(&text)?;
//! let series = history.channel(1).unwrap();
//! let steady = SteadyStateAnalyzer::new(AnalysisConfig::resistance()).analyze(&series)?;
//! println!("converged mean {:.4}", steady.mean());
//! ```

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod spectral;
pub mod types;

// Re-exports
pub use analysis::{
    ConvergenceDetector, ConvergenceResult, Cycle, CycleSegmenter, CycleSet, SteadyState,
    SteadyStateAnalyzer,
};
pub use config::{AnalysisConfig, ConfigError, ProjectConfig};
pub use ingest::{FrequencyTable, TableParser, TimeHistory, TimeHistoryParser};
pub use spectral::{
    EncounterMapping, FrequencyConvention, FrequencyNode, FrequencyNodes, IttcSpectrum,
    ScenarioDecision, SpectralAggregator, SpectralScenario, WaveSpectrum,
};
pub use types::{ProcessError, ProcessResult, TimeSeries};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{CycleSegmenter, ConvergenceDetector, SteadyStateAnalyzer};
    pub use crate::config::{AnalysisConfig, ConventionChoice, ProjectConfig, SeaStateConfig};
    pub use crate::ingest::{TableParser, TimeHistoryParser};
    pub use crate::spectral::{EncounterMapping, FrequencyNodes, IttcSpectrum, SpectralAggregator};
    pub use crate::types::{ProcessError, ProcessResult, TimeSeries};
}
