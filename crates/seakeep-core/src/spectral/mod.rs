//! Frequency-Domain Aggregation Module
//!
//! Combines converged regular-wave responses at discrete frequencies into
//! irregular-sea statistics for a parametric wave spectrum.
//!
//! ## Features
//!
//! - **Wave Spectrum**: ITTC two-parameter spectrum behind the [`WaveSpectrum`] trait
//! - **Encounter Mapping**: absolute/encounter frequency conversion and Jacobian
//! - **Quadrature**: trapezoidal node weights over unevenly spaced frequencies
//! - **Aggregation**: spectral moments, mean response and the frequency-reading decision
//!
//! ## Example
//!
//! ```rust,no_run
//! use seakeep_core::config::ConventionChoice;
//! use seakeep_core::spectral::{
//!     EncounterMapping, FrequencyNode, FrequencyNodes, IttcSpectrum, SpectralAggregator,
//! };
//!
//! let nodes: Vec<FrequencyNode> = vec![]; // One node per regular-wave run
//! let nodes = FrequencyNodes::new(nodes).unwrap();
//!
//! let spectrum = IttcSpectrum::new(5.5, 9.0).unwrap();
//! let aggregator = SpectralAggregator::new(spectrum, EncounterMapping::new(7.97, 180.0));
//! let decision = aggregator.decide(&nodes, ConventionChoice::Auto).unwrap();
//! println!("Mean response: {:.4}", decision.chosen_scenario().mean_response);
//! ```

pub mod aggregate;
pub mod encounter;
pub mod quadrature;
pub mod spectrum;

pub use aggregate::{
    significant_value, FrequencyConvention, FrequencyNode, NodeContribution, ScenarioDecision,
    SpectralAggregator, SpectralScenario,
};
pub use encounter::EncounterMapping;
pub use quadrature::{node_weights, FrequencyNodes};
pub use spectrum::{IttcSpectrum, WaveSpectrum};
