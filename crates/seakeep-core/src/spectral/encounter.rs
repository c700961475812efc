//! Encounter Frequency
//!
//! A ship moving at speed `U` with wave heading `β` meets a wave of absolute
//! frequency `ω` at the encounter frequency
//!
//! ```text
//!   ωe = ω - a·ω²,    a = U·cos(β) / g
//! ```
//!
//! Heading 180° is head seas (`a < 0`, `ωe > ω`); 0° is following seas.
//!
//! The inverse solves `a·ω² - ω + ωe = 0`. Of the positive roots the one
//! closest to `ωe` is taken, which is the branch connected to zero speed.
//! In following seas that branch only covers `ω < 1/(2a)`; frequencies past
//! the turning point map back to the other root.

use crate::types::{ProcessError, ProcessResult, STANDARD_GRAVITY};
use serde::Serialize;

/// Speeds/headings with `|a|` below this are treated as stationary
const STATIONARY_COEFFICIENT: f64 = 1e-12;

/// Absolute/encounter frequency mapping for one speed and heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncounterMapping {
    /// Forward speed in m/s
    pub speed_ms: f64,
    /// Wave heading in degrees, 180 = head seas
    pub heading_deg: f64,
    /// Gravitational acceleration in m/s²
    pub gravity: f64,
}

impl Default for EncounterMapping {
    fn default() -> Self {
        Self::new(0.0, 180.0)
    }
}

impl EncounterMapping {
    pub fn new(speed_ms: f64, heading_deg: f64) -> Self {
        Self {
            speed_ms,
            heading_deg,
            gravity: STANDARD_GRAVITY,
        }
    }

    /// Builder: override gravity
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// `a = U·cos(β)/g`
    pub fn coefficient(&self) -> f64 {
        self.speed_ms * self.heading_deg.to_radians().cos() / self.gravity
    }

    pub fn is_stationary(&self) -> bool {
        self.coefficient().abs() < STATIONARY_COEFFICIENT
    }

    pub fn encounter_frequency(&self, omega_abs: f64) -> f64 {
        let a = self.coefficient();
        omega_abs - a * omega_abs * omega_abs
    }

    /// Absolute frequency met at `omega_enc`
    pub fn absolute_frequency(&self, omega_enc: f64) -> ProcessResult<f64> {
        let a = self.coefficient();
        if a.abs() < STATIONARY_COEFFICIENT {
            return Ok(omega_enc);
        }

        let unresolvable = ProcessError::UnresolvableFrequency { omega_enc };
        let disc = 1.0 - 4.0 * a * omega_enc;
        if disc <= 0.0 {
            return Err(unresolvable);
        }

        let root = disc.sqrt();
        [(1.0 + root) / (2.0 * a), (1.0 - root) / (2.0 * a)]
            .into_iter()
            .filter(|w| *w > 0.0)
            .min_by(|x, y| (x - omega_enc).abs().total_cmp(&(y - omega_enc).abs()))
            .ok_or(unresolvable)
    }

    /// `|dω/dωe| = |1 / (1 - 2aω)|` at absolute frequency `omega_abs`,
    /// `None` at the turning point
    pub fn jacobian(&self, omega_abs: f64) -> Option<f64> {
        let denom = 1.0 - 2.0 * self.coefficient() * omega_abs;
        if denom == 0.0 {
            return None;
        }
        Some((1.0 / denom).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KNOT_TO_MS;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_speed_is_identity() {
        let mapping = EncounterMapping::new(0.0, 180.0);
        assert!(mapping.is_stationary());
        assert_eq!(mapping.encounter_frequency(0.7), 0.7);
        assert_eq!(mapping.absolute_frequency(0.7).unwrap(), 0.7);
        assert_eq!(mapping.jacobian(0.7), Some(1.0));
    }

    #[test]
    fn test_beam_seas_are_stationary() {
        let mapping = EncounterMapping::new(8.0, 90.0);
        assert!(mapping.is_stationary());
        assert_relative_eq!(mapping.encounter_frequency(0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_head_seas_raise_frequency() {
        let mapping = EncounterMapping::new(15.5 * KNOT_TO_MS, 180.0);
        let a = mapping.coefficient();
        assert!(a < 0.0);
        let we = mapping.encounter_frequency(0.6);
        assert_relative_eq!(we, 0.6 - a * 0.36);
        assert!(we > 0.6);
    }

    #[test]
    fn test_round_trip_head_and_oblique_seas() {
        for &heading in &[180.0, 150.0, 120.0, 240.0, 90.0] {
            for &speed in &[0.0, 2.0, 8.0] {
                let mapping = EncounterMapping::new(speed, heading);
                for i in 1..=30 {
                    let omega = i as f64 * 0.05;
                    let we = mapping.encounter_frequency(omega);
                    let back = mapping.absolute_frequency(we).unwrap();
                    assert!(
                        (back - omega).abs() < 1e-9,
                        "heading {} speed {}: {} -> {} -> {}",
                        heading,
                        speed,
                        omega,
                        we,
                        back
                    );
                }
            }
        }
    }

    #[test]
    fn test_round_trip_following_seas_below_turning_point() {
        let mapping = EncounterMapping::new(5.0, 0.0);
        let turning = 1.0 / (2.0 * mapping.coefficient());
        for i in 1..20 {
            let omega = turning * i as f64 / 20.0;
            let back = mapping
                .absolute_frequency(mapping.encounter_frequency(omega))
                .unwrap();
            assert_relative_eq!(back, omega, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_unreachable_encounter_frequency() {
        // Following seas: ωe peaks at 1/(4a)
        let mapping = EncounterMapping::new(5.0, 0.0);
        let peak = 1.0 / (4.0 * mapping.coefficient());
        let err = mapping.absolute_frequency(peak * 1.1).unwrap_err();
        assert!(matches!(err, ProcessError::UnresolvableFrequency { .. }));
    }

    #[test]
    fn test_jacobian() {
        let mapping = EncounterMapping::new(5.0, 180.0);
        let a = mapping.coefficient();
        assert_relative_eq!(mapping.jacobian(0.5).unwrap(), 1.0 / (1.0 - a).abs());

        let following = EncounterMapping::new(5.0, 0.0);
        let turning = 1.0 / (2.0 * following.coefficient());
        assert!(following.jacobian(turning).map_or(true, |j| j > 1e12));
    }
}
