//! # Configuration System
//!
//! YAML-backed configuration for the seakeep pipeline:
//!
//! - Cycle segmentation (minimum samples per cycle, reference-level policy)
//! - Convergence detection (tail policy and relative tolerances)
//! - Sea state for spectral aggregation (Hs, period, speed, heading)
//! - Column roles for per-frequency aggregation tables
//!
//! ## Example Configuration
//!
//! ```yaml
//! analysis:
//!   segmenter:
//!     min_points_per_cycle: 10
//!     reference:
//!       kind: tail_mean
//!       fraction: 0.3333333333333333
//!   convergence:
//!     min_converged_cycles: 5
//!     tol_mean_rel: 0.005
//!     tol_amp_rel: 0.005
//!     tail_policy:
//!       kind: scan
//!
//! sea_state:
//!   significant_height: 5.5
//!   period: 9.0
//!   period_kind: tp
//!   speed: 15.5
//!   speed_unit: knots
//!   heading_deg: 180.0
//!   convention: auto
//!
//! columns:
//!   frequency: omega
//!   mean_response: 增阻
//!   amplitudes:
//!     - name: heave
//!       column: 垂荡
//!     - name: pitch
//!       column: 纵摇
//! ```

use crate::types::KNOT_TO_MS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Error type for configuration operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadError(String),
    #[error("failed to parse config: {0}")]
    ParseError(String),
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// How the zero level for up-crossing detection is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceLevel {
    /// Mean of the trailing `fraction` of the samples (by index)
    TailMean { fraction: f64 },
    /// A caller-supplied level
    Fixed { value: f64 },
    /// Mean of every sample
    WholeMean,
}

impl Default for ReferenceLevel {
    fn default() -> Self {
        ReferenceLevel::TailMean { fraction: 1.0 / 3.0 }
    }
}

/// Cycle segmentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Cycles holding fewer samples are discarded
    pub min_points_per_cycle: usize,
    /// Zero level policy
    pub reference: ReferenceLevel,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_points_per_cycle: 10,
            reference: ReferenceLevel::default(),
        }
    }
}

/// Which part of the cycle sequence counts as converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TailPolicy {
    /// Search for the longest tail whose relative RMS change is within tolerance
    #[default]
    Scan,
    /// Always average the last `cycles` cycles
    FixedWindow { cycles: usize },
}

impl TailPolicy {
    /// Parse policy from string ("scan", "fixed", "fixed:12")
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "scan" | "search" => Some(TailPolicy::Scan),
            "fixed" | "window" => Some(TailPolicy::FixedWindow { cycles: 10 }),
            other => other
                .strip_prefix("fixed:")
                .and_then(|n| n.parse().ok())
                .map(|cycles| TailPolicy::FixedWindow { cycles }),
        }
    }
}

/// Convergence detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Shortest tail that may be declared converged
    pub min_converged_cycles: usize,
    /// Relative RMS change allowed in the per-cycle means
    pub tol_mean_rel: f64,
    /// Relative RMS change allowed in the per-cycle amplitudes
    pub tol_amp_rel: f64,
    pub tail_policy: TailPolicy,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            min_converged_cycles: 8,
            tol_mean_rel: 0.02,
            tol_amp_rel: 0.02,
            tail_policy: TailPolicy::Scan,
        }
    }
}

/// Settings for turning one channel into a converged (mean, amplitude) pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub segmenter: SegmenterConfig,
    pub convergence: ConvergenceConfig,
}

impl AnalysisConfig {
    /// Added-resistance runs: tight tolerances, short minimum tail
    pub fn resistance() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            convergence: ConvergenceConfig {
                min_converged_cycles: 5,
                tol_mean_rel: 0.005,
                tol_amp_rel: 0.005,
                tail_policy: TailPolicy::Scan,
            },
        }
    }

    /// Motion runs: last ten cycles, zero level from the last 40% of samples
    pub fn motion() -> Self {
        Self {
            segmenter: SegmenterConfig {
                min_points_per_cycle: 10,
                reference: ReferenceLevel::TailMean { fraction: 0.4 },
            },
            convergence: ConvergenceConfig {
                tail_policy: TailPolicy::FixedWindow { cycles: 10 },
                ..ConvergenceConfig::default()
            },
        }
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::default()),
            "resistance" => Some(Self::resistance()),
            "motion" => Some(Self::motion()),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let ReferenceLevel::TailMean { fraction } = self.segmenter.reference {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ConfigError::ValidationError(format!(
                    "reference tail fraction must be in (0, 1], got {}",
                    fraction
                )));
            }
        }
        let conv = &self.convergence;
        if conv.min_converged_cycles == 0 {
            return Err(ConfigError::ValidationError(
                "min_converged_cycles must be at least 1".to_string(),
            ));
        }
        if conv.tol_mean_rel < 0.0 || conv.tol_amp_rel < 0.0 {
            return Err(ConfigError::ValidationError(
                "convergence tolerances must be non-negative".to_string(),
            ));
        }
        if conv.tail_policy == (TailPolicy::FixedWindow { cycles: 0 }) {
            return Err(ConfigError::ValidationError(
                "fixed window must cover at least one cycle".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether the configured wave period is the peak or the zero-crossing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    #[default]
    Tp,
    Tz,
}

impl PeriodKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tp" | "peak" => Some(PeriodKind::Tp),
            "tz" | "zero-crossing" => Some(PeriodKind::Tz),
            _ => None,
        }
    }
}

/// Unit of the configured forward speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    MetersPerSecond,
    #[default]
    Knots,
}

impl SpeedUnit {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ms" | "m/s" | "mps" => Some(SpeedUnit::MetersPerSecond),
            "kn" | "kt" | "knots" => Some(SpeedUnit::Knots),
            _ => None,
        }
    }

    /// Convert a speed in this unit to m/s
    pub fn to_ms(&self, speed: f64) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => speed,
            SpeedUnit::Knots => speed * KNOT_TO_MS,
        }
    }
}

/// What the frequency column of an aggregation table means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConventionChoice {
    /// Decide from the wave-elevation moment
    #[default]
    Auto,
    /// Absolute wave frequency
    Absolute,
    /// Encounter frequency
    Encounter,
}

impl ConventionChoice {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Some(ConventionChoice::Auto),
            "abs" | "absolute" => Some(ConventionChoice::Absolute),
            "enc" | "encounter" => Some(ConventionChoice::Encounter),
            _ => None,
        }
    }
}

/// Sea state and ship kinematics for spectral aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeaStateConfig {
    /// Significant wave height Hs in metres
    pub significant_height: f64,
    /// Wave period in seconds (meaning set by `period_kind`)
    pub period: f64,
    pub period_kind: PeriodKind,
    /// Tp/Tz ratio used when `period_kind` is Tz
    pub tp_over_tz: f64,
    /// Forward speed (unit set by `speed_unit`)
    pub speed: f64,
    pub speed_unit: SpeedUnit,
    /// Wave heading in degrees, 180 = head seas
    pub heading_deg: f64,
    pub convention: ConventionChoice,
}

impl Default for SeaStateConfig {
    fn default() -> Self {
        Self {
            significant_height: 1.0,
            period: 10.0,
            period_kind: PeriodKind::Tp,
            tp_over_tz: 1.41,
            speed: 0.0,
            speed_unit: SpeedUnit::Knots,
            heading_deg: 180.0,
            convention: ConventionChoice::Auto,
        }
    }
}

impl SeaStateConfig {
    /// Modal (peak) period Tp in seconds
    pub fn peak_period(&self) -> f64 {
        match self.period_kind {
            PeriodKind::Tp => self.period,
            PeriodKind::Tz => self.period * self.tp_over_tz,
        }
    }

    /// Forward speed in m/s
    pub fn speed_ms(&self) -> f64 {
        self.speed_unit.to_ms(self.speed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.significant_height > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "significant wave height must be positive, got {}",
                self.significant_height
            )));
        }
        if !(self.peak_period() > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "wave period must be positive, got {}",
                self.period
            )));
        }
        if self.speed < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "speed must be non-negative, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

/// Identifies a table column by position or by header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelector {
    /// Zero-based column index
    Index(usize),
    /// Case-insensitive substring of the header cell
    Header(String),
}

impl ColumnSelector {
    /// Parse a command-line selector: digits select by index, anything else by header
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<usize>() {
            Ok(index) => ColumnSelector::Index(index),
            Err(_) => ColumnSelector::Header(s.trim().to_string()),
        }
    }

    /// Resolve against a header row
    pub fn resolve(&self, header: &[&str]) -> Option<usize> {
        match self {
            ColumnSelector::Index(index) => (*index < header.len()).then_some(*index),
            ColumnSelector::Header(label) => {
                let needle = label.to_lowercase();
                header
                    .iter()
                    .position(|cell| cell.trim().to_lowercase().contains(&needle))
            }
        }
    }
}

/// An amplitude channel of an aggregation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedColumn {
    pub name: String,
    pub column: ColumnSelector,
}

/// Semantic roles of the columns of a per-frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRoles {
    pub frequency: ColumnSelector,
    /// Linearly weighted response (mean added resistance)
    pub mean_response: ColumnSelector,
    /// Amplitude channels weighted by amplitude squared (heave, pitch, ...)
    pub amplitudes: Vec<NamedColumn>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            frequency: ColumnSelector::Header("omega".to_string()),
            mean_response: ColumnSelector::Header("增阻".to_string()),
            amplitudes: vec![
                NamedColumn {
                    name: "heave".to_string(),
                    column: ColumnSelector::Header("垂荡".to_string()),
                },
                NamedColumn {
                    name: "pitch".to_string(),
                    column: ColumnSelector::Header("纵摇".to_string()),
                },
            ],
        }
    }
}

/// Ship particulars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Reference length in metres
    pub length: f64,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self { length: 325.5 }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub analysis: AnalysisConfig,
    pub sea_state: SeaStateConfig,
    pub columns: ColumnRoles,
    pub ship: ShipConfig,
}

impl ProjectConfig {
    /// Load configuration from a YAML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        if !(self.ship.length > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "ship length must be positive, got {}",
                self.ship.length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = ProjectConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.sea_state.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip_keeps_policies() {
        let mut config = ProjectConfig::default();
        config.analysis = AnalysisConfig::motion();
        config.columns.frequency = ColumnSelector::Index(0);

        let yaml = config.to_yaml().unwrap();
        let parsed = ProjectConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "sea_state:\n  significant_height: 5.5\n  speed_unit: meters_per_second\n";
        let config = ProjectConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.sea_state.significant_height, 5.5);
        assert_eq!(config.sea_state.speed_unit, SpeedUnit::MetersPerSecond);
        assert_eq!(config.sea_state.period, 10.0);
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_invalid_tail_fraction_rejected() {
        let mut config = AnalysisConfig::default();
        config.segmenter.reference = ReferenceLevel::TailMean { fraction: 0.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tail_windows_rejected() {
        let mut config = AnalysisConfig::resistance();
        config.convergence.min_converged_cycles = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = AnalysisConfig::motion();
        config.convergence.tail_policy = TailPolicy::from_str("fixed:0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        assert!(AnalysisConfig::resistance().validate().is_ok());
        assert!(AnalysisConfig::motion().validate().is_ok());
    }

    #[test]
    fn test_peak_period_from_tz() {
        let sea = SeaStateConfig {
            period: 7.0,
            period_kind: PeriodKind::Tz,
            ..Default::default()
        };
        assert!((sea.peak_period() - 9.87).abs() < 1e-9);
    }

    #[test]
    fn test_knots_conversion() {
        let sea = SeaStateConfig {
            speed: 15.5,
            ..Default::default()
        };
        assert!((sea.speed_ms() - 7.973_888_9).abs() < 1e-6);
    }

    #[test]
    fn test_column_selector_resolution() {
        let header = ["Omega (rad/s)", "增阻均值", "垂荡幅值"];
        assert_eq!(ColumnSelector::parse("omega").resolve(&header), Some(0));
        assert_eq!(ColumnSelector::parse("增阻").resolve(&header), Some(1));
        assert_eq!(ColumnSelector::parse("2").resolve(&header), Some(2));
        assert_eq!(ColumnSelector::parse("7").resolve(&header), None);
        assert_eq!(ColumnSelector::parse("纵摇").resolve(&header), None);
    }

    #[test]
    fn test_tail_policy_parsing() {
        assert_eq!(TailPolicy::from_str("scan"), Some(TailPolicy::Scan));
        assert_eq!(
            TailPolicy::from_str("fixed"),
            Some(TailPolicy::FixedWindow { cycles: 10 })
        );
        assert_eq!(
            TailPolicy::from_str("fixed:4"),
            Some(TailPolicy::FixedWindow { cycles: 4 })
        );
        assert_eq!(TailPolicy::from_str("bogus"), None);
    }
}
