//! Spectral Aggregation
//!
//! Folds per-frequency regular-wave results into irregular-sea statistics.
//! For a node at frequency `f` with band width `w` and spectral density `S`:
//!
//! ```text
//!   weighted density   a2   = 2·S·w
//!   mean response      dR   = R·a2
//!   channel moment     dm0  = H²·S·w
//!   wave moment        m0η += S·w
//! ```
//!
//! The node frequency may be either absolute or encounter frequency. Both
//! readings are always evaluated; in the encounter reading the spectrum is
//! looked up at the matching absolute frequency and scaled by the Jacobian.
//! When the labelling is unknown, the reading whose wave moment is closer to
//! `Hs²/16` is chosen.

use super::encounter::EncounterMapping;
use super::quadrature::FrequencyNodes;
use super::spectrum::WaveSpectrum;
use crate::config::ConventionChoice;
use crate::types::{ProcessError, ProcessResult};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::{debug, info, warn};

/// One row of a per-frequency table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyNode {
    /// Absolute or encounter frequency in rad/s
    pub frequency: f64,
    /// Linearly weighted response (mean added resistance)
    pub mean_response: f64,
    /// Amplitude channels, weighted by their square
    pub amplitudes: Vec<f64>,
}

/// How node frequencies are read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyConvention {
    Absolute,
    Encounter,
}

impl FrequencyConvention {
    /// Short tag ("abs" / "enc")
    pub fn tag(&self) -> &'static str {
        match self {
            FrequencyConvention::Absolute => "abs",
            FrequencyConvention::Encounter => "enc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "abs" | "absolute" => Some(FrequencyConvention::Absolute),
            "enc" | "encounter" => Some(FrequencyConvention::Encounter),
            _ => None,
        }
    }

    /// Column label for node frequencies in this reading
    pub fn frequency_label(&self) -> &'static str {
        match self {
            FrequencyConvention::Absolute => "omega(rad/s)",
            FrequencyConvention::Encounter => "omega_e(rad/s)",
        }
    }
}

/// Contribution of one node to a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeContribution {
    /// Node frequency as given
    pub frequency: f64,
    /// Quadrature band width
    pub weight: f64,
    /// Absolute frequency, `None` when it could not be resolved
    pub omega_abs: Option<f64>,
    /// Encounter frequency
    pub omega_enc: f64,
    /// Density scale factor, only in the encounter reading
    pub jacobian: Option<f64>,
    /// Spectral density used for this node
    pub density: f64,
    /// `2·S·w`
    pub weighted_density: f64,
    pub mean_response: f64,
    /// `R·2·S·w`
    pub d_response: f64,
    pub amplitudes: Vec<f64>,
    /// `H²·S·w` per channel
    pub d_m0: Vec<f64>,
}

/// Totals and per-node rows for one frequency reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralScenario {
    pub convention: FrequencyConvention,
    pub rows: Vec<NodeContribution>,
    /// Wave elevation moment `Σ S·w`
    pub m0_eta: f64,
    /// Irregular-sea mean response `Σ dR`
    pub mean_response: f64,
    /// Per-channel moments `Σ dm0`
    pub channel_m0: Vec<f64>,
    /// Nodes excluded because their frequency could not be resolved
    pub unresolved: usize,
}

/// `4·√max(m0, 0)`
pub fn significant_value(m0: f64) -> f64 {
    4.0 * m0.max(0.0).sqrt()
}

fn ratio(part: f64, total: f64) -> f64 {
    if total != 0.0 {
        part / total
    } else {
        0.0
    }
}

impl SpectralScenario {
    /// Significant value of an amplitude channel
    pub fn significant(&self, channel: usize) -> Option<f64> {
        self.channel_m0.get(channel).map(|&m0| significant_value(m0))
    }

    /// Fraction of the mean response contributed by a row
    pub fn share_of_response(&self, row: usize) -> Option<f64> {
        self.rows
            .get(row)
            .map(|r| ratio(r.d_response, self.mean_response))
    }

    /// Fraction of a channel moment contributed by a row
    pub fn share_of_channel(&self, row: usize, channel: usize) -> Option<f64> {
        let r = self.rows.get(row)?;
        let total = *self.channel_m0.get(channel)?;
        Some(ratio(*r.d_m0.get(channel)?, total))
    }

    /// Rows with the largest response contribution first
    pub fn top_contributors(&self, n: usize) -> Vec<&NodeContribution> {
        let mut rows: Vec<&NodeContribution> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.d_response.total_cmp(&a.d_response));
        rows.truncate(n);
        rows
    }

    /// Per-node detail table
    pub fn to_csv(&self, channel_names: &[String]) -> String {
        let mut out = String::new();
        out.push_str(self.convention.frequency_label());
        out.push_str(",weight,density,weighted_density,mean_response,d_response,d_response_ratio");
        for name in channel_names {
            let _ = write!(out, ",{0},dm0_{0},dm0_{0}_ratio", name);
        }
        out.push_str(",omega_abs,omega_enc,jacobian\n");

        for (i, row) in self.rows.iter().enumerate() {
            let _ = write!(
                out,
                "{},{},{},{},{},{},{}",
                row.frequency,
                row.weight,
                row.density,
                row.weighted_density,
                row.mean_response,
                row.d_response,
                ratio(row.d_response, self.mean_response)
            );
            for ch in 0..channel_names.len() {
                let amp = row.amplitudes.get(ch).copied().unwrap_or(0.0);
                let dm0 = row.d_m0.get(ch).copied().unwrap_or(0.0);
                let share = self.share_of_channel(i, ch).unwrap_or(0.0);
                let _ = write!(out, ",{},{},{}", amp, dm0, share);
            }
            let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
            let _ = writeln!(
                out,
                ",{},{},{}",
                opt(row.omega_abs),
                row.omega_enc,
                opt(row.jacobian)
            );
        }
        out
    }
}

/// Outcome of evaluating both readings and picking one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDecision {
    pub requested: ConventionChoice,
    pub chosen: FrequencyConvention,
    /// `Hs²/16`
    pub m0_theory: f64,
    pub absolute: SpectralScenario,
    pub encounter: SpectralScenario,
    /// `|m0η - m0_theory| / m0_theory` of each reading
    pub error_absolute: f64,
    pub error_encounter: f64,
}

impl ScenarioDecision {
    pub fn chosen_scenario(&self) -> &SpectralScenario {
        match self.chosen {
            FrequencyConvention::Absolute => &self.absolute,
            FrequencyConvention::Encounter => &self.encounter,
        }
    }

    /// Captured share of the theoretical wave moment
    pub fn coverage(&self) -> f64 {
        ratio(self.chosen_scenario().m0_eta, self.m0_theory)
    }

    /// Format as text report
    pub fn to_text(&self, channel_names: &[String], top: usize) -> String {
        let chosen = self.chosen_scenario();
        let mut out = String::new();

        out.push_str("Spectral Aggregation\n");
        out.push_str(&"═".repeat(50));
        out.push('\n');
        let _ = writeln!(out, "Theoretical m0:    {:.6e} (Hs²/16)", self.m0_theory);
        let _ = writeln!(
            out,
            "As absolute:       m0 = {:.6e} (error {:.2}%)",
            self.absolute.m0_eta,
            self.error_absolute * 100.0
        );
        let _ = writeln!(
            out,
            "As encounter:      m0 = {:.6e} (error {:.2}%)",
            self.encounter.m0_eta,
            self.error_encounter * 100.0
        );
        let how = match self.requested {
            ConventionChoice::Auto => "auto",
            _ => "requested",
        };
        let _ = writeln!(out, "Chosen:            {} ({})", chosen.convention.tag().to_uppercase(), how);
        if chosen.unresolved > 0 {
            let _ = writeln!(out, "Unresolved nodes:  {}", chosen.unresolved);
        }

        out.push_str("\nResults\n");
        out.push_str(&"─".repeat(50));
        out.push('\n');
        let _ = writeln!(out, "Mean response:     {:.10}", chosen.mean_response);
        for (i, name) in channel_names.iter().enumerate() {
            if let Some(sig) = chosen.significant(i) {
                let _ = writeln!(out, "{:<19}{:.10}", format!("{} (4√m0):", name), sig);
            }
        }
        let _ = writeln!(out, "Coverage:          {:.2}%", self.coverage() * 100.0);

        if top > 0 {
            let _ = writeln!(out, "\nTop {} Contributors", top);
            out.push_str(&"─".repeat(50));
            out.push('\n');
            let _ = writeln!(
                out,
                "{:<10} {:<10} {:<12} {:<12} {:<12} {:<8}",
                "Freq", "Weight", "Density", "Response", "dR", "Share%"
            );
            for row in chosen.top_contributors(top) {
                let _ = writeln!(
                    out,
                    "{:<10.4} {:<10.4} {:<12.4e} {:<12.4} {:<12.4e} {:<8.2}",
                    row.frequency,
                    row.weight,
                    row.density,
                    row.mean_response,
                    row.d_response,
                    ratio(row.d_response, chosen.mean_response) * 100.0
                );
            }
        }

        out
    }
}

/// Aggregates frequency nodes against a wave spectrum
#[derive(Debug, Clone)]
pub struct SpectralAggregator<S: WaveSpectrum> {
    spectrum: S,
    mapping: EncounterMapping,
}

impl<S: WaveSpectrum> SpectralAggregator<S> {
    pub fn new(spectrum: S, mapping: EncounterMapping) -> Self {
        Self { spectrum, mapping }
    }

    pub fn spectrum(&self) -> &S {
        &self.spectrum
    }

    pub fn mapping(&self) -> &EncounterMapping {
        &self.mapping
    }

    /// Evaluate one reading of the node frequencies
    pub fn scenario(
        &self,
        nodes: &FrequencyNodes,
        convention: FrequencyConvention,
    ) -> SpectralScenario {
        let channels = nodes.channel_count();
        let mut rows = Vec::with_capacity(nodes.len());
        let mut m0_eta = 0.0;
        let mut mean_response = 0.0;
        let mut channel_m0 = vec![0.0; channels];
        let mut unresolved = 0;

        for (node, weight) in nodes.iter() {
            let (omega_abs, omega_enc, jacobian, density) = match convention {
                FrequencyConvention::Absolute => {
                    let omega_enc = self.mapping.encounter_frequency(node.frequency);
                    let density = self.spectrum.density(node.frequency);
                    (Some(node.frequency), omega_enc, None, density)
                }
                FrequencyConvention::Encounter => {
                    match self.mapping.absolute_frequency(node.frequency) {
                        Ok(omega_abs) => {
                            let jacobian = self.mapping.jacobian(omega_abs);
                            let density = jacobian
                                .map(|j| self.spectrum.density(omega_abs) * j)
                                .unwrap_or(0.0);
                            (Some(omega_abs), node.frequency, jacobian, density)
                        }
                        Err(e) => {
                            warn!("{}; node contributes nothing", e);
                            unresolved += 1;
                            (None, node.frequency, None, 0.0)
                        }
                    }
                }
            };
            let density = if density.is_finite() { density } else { 0.0 };

            let weighted_density = 2.0 * density * weight;
            let d_response = node.mean_response * weighted_density;
            let d_m0: Vec<f64> = node
                .amplitudes
                .iter()
                .map(|h| h * h * density * weight)
                .collect();

            m0_eta += density * weight;
            mean_response += d_response;
            for (total, d) in channel_m0.iter_mut().zip(&d_m0) {
                *total += d;
            }

            rows.push(NodeContribution {
                frequency: node.frequency,
                weight,
                omega_abs,
                omega_enc,
                jacobian,
                density,
                weighted_density,
                mean_response: node.mean_response,
                d_response,
                amplitudes: node.amplitudes.clone(),
                d_m0,
            });
        }

        debug!(
            "Scenario {}: m0 = {:.6e}, mean response = {:.6e}",
            convention.tag(),
            m0_eta,
            mean_response
        );

        SpectralScenario {
            convention,
            rows,
            m0_eta,
            mean_response,
            channel_m0,
            unresolved,
        }
    }

    /// Evaluate both readings and choose one
    pub fn decide(
        &self,
        nodes: &FrequencyNodes,
        requested: ConventionChoice,
    ) -> ProcessResult<ScenarioDecision> {
        let m0_theory = self.spectrum.m0_theory();
        if m0_theory == 0.0 {
            return Err(ProcessError::DegenerateSpectrum(
                "theoretical wave moment is zero".to_string(),
            ));
        }

        let absolute = self.scenario(nodes, FrequencyConvention::Absolute);
        let encounter = self.scenario(nodes, FrequencyConvention::Encounter);
        if absolute.m0_eta == 0.0 && encounter.m0_eta == 0.0 {
            return Err(ProcessError::DegenerateSpectrum(
                "no spectral energy at any node".to_string(),
            ));
        }

        let error_absolute = (absolute.m0_eta - m0_theory).abs() / m0_theory;
        let error_encounter = (encounter.m0_eta - m0_theory).abs() / m0_theory;

        let chosen = match requested {
            ConventionChoice::Absolute => FrequencyConvention::Absolute,
            ConventionChoice::Encounter => FrequencyConvention::Encounter,
            ConventionChoice::Auto if error_absolute <= error_encounter => {
                FrequencyConvention::Absolute
            }
            ConventionChoice::Auto => FrequencyConvention::Encounter,
        };

        info!(
            "Frequency reading: {} (abs error {:.2}%, enc error {:.2}%)",
            chosen.tag(),
            error_absolute * 100.0,
            error_encounter * 100.0
        );

        Ok(ScenarioDecision {
            requested,
            chosen,
            m0_theory,
            absolute,
            encounter,
            error_absolute,
            error_encounter,
        })
    }
}
