//! Zero Up-Crossing Cycle Segmentation
//!
//! Splits an oscillatory response into consecutive cycles delimited by zero
//! up-crossings of the level-removed signal, and reduces each cycle to its mean
//! and half peak-to-peak amplitude.
//!
//! ```text
//!            cycle 1          cycle 2
//!        |<----------->|<----------->|
//!   level +-----/\------+-----/\------+----
//!         |    /  \     |    /  \     |
//!         |   /    \    |   /    \    |
//!        ^|  /      \  /|  /      \  /
//!     up-crossing    \/ up-crossing  \/
//! ```
//!
//! The crossing time is interpolated linearly between the two bracketing
//! samples. Cycles holding fewer than `min_points_per_cycle` samples are
//! dropped, which suppresses double crossings caused by noise near the level.

use crate::config::{ReferenceLevel, SegmenterConfig};
use crate::types::{mean, ProcessError, ProcessResult, TimeSeries};
use serde::Serialize;
use tracing::debug;

/// One oscillation cycle between two consecutive up-crossings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cycle {
    /// 1-based position among the retained cycles
    pub index: usize,
    /// Up-crossing time that opens the cycle
    pub start: f64,
    /// Up-crossing time that closes the cycle
    pub end: f64,
    /// Mean of the raw samples inside the cycle
    pub mean: f64,
    /// Half the peak-to-peak range of the samples inside the cycle
    pub amplitude: f64,
    /// Number of samples inside `[start, end)`
    pub samples: usize,
}

impl Cycle {
    pub fn period(&self) -> f64 {
        self.end - self.start
    }
}

/// Retained cycles of one channel plus the crossing data they were cut from
#[derive(Debug, Clone, Serialize)]
pub struct CycleSet {
    pub cycles: Vec<Cycle>,
    /// Every up-crossing time, including ones bounding discarded cycles
    pub crossing_times: Vec<f64>,
    /// Level removed before crossing detection
    pub level: f64,
}

impl CycleSet {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Per-cycle means in cycle order
    pub fn means(&self) -> Vec<f64> {
        self.cycles.iter().map(|c| c.mean).collect()
    }

    /// Per-cycle amplitudes in cycle order
    pub fn amplitudes(&self) -> Vec<f64> {
        self.cycles.iter().map(|c| c.amplitude).collect()
    }

    /// Steady period estimate: mean crossing interval over the second half
    /// of the interval list
    pub fn estimated_period(&self) -> Option<f64> {
        if self.crossing_times.len() < 2 {
            return None;
        }
        let intervals: Vec<f64> = self
            .crossing_times
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect();
        let tail = &intervals[intervals.len() / 2..];
        Some(mean(tail))
    }
}

/// Zero up-crossing segmenter
#[derive(Debug, Clone, Default)]
pub struct CycleSegmenter {
    config: SegmenterConfig,
}

impl CycleSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    /// Segmenter with a minimum cycle size and the default level policy
    pub fn with_min_points(min_points_per_cycle: usize) -> Self {
        Self::new(SegmenterConfig {
            min_points_per_cycle,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Level that is subtracted before crossing detection
    pub fn reference_level(&self, values: &[f64]) -> f64 {
        match self.config.reference {
            ReferenceLevel::Fixed { value } => value,
            ReferenceLevel::WholeMean => mean(values),
            ReferenceLevel::TailMean { fraction } => {
                let keep = fraction.clamp(0.0, 1.0);
                let start = ((values.len() as f64) * (1.0 - keep)) as usize;
                let start = start.min(values.len().saturating_sub(1));
                mean(&values[start..])
            }
        }
    }

    /// Segment a series using the configured level policy
    pub fn segment(&self, series: &TimeSeries) -> ProcessResult<CycleSet> {
        let level = self.reference_level(series.values());
        self.segment_at(series, level)
    }

    /// Segment a series around an explicit level
    pub fn segment_at(&self, series: &TimeSeries, level: f64) -> ProcessResult<CycleSet> {
        let time = series.time();
        let values = series.values();

        let crossing_times = up_crossings(time, values, level);
        if crossing_times.len() < 2 {
            return Err(ProcessError::InsufficientCrossings {
                found: crossing_times.len(),
            });
        }

        let min_points = self.config.min_points_per_cycle;
        let mut cycles = Vec::with_capacity(crossing_times.len() - 1);

        for bounds in crossing_times.windows(2) {
            let (start, end) = (bounds[0], bounds[1]);

            // Time is sorted, so the samples in [start, end) are contiguous
            let first = time.partition_point(|&t| t < start);
            let last = time.partition_point(|&t| t < end);
            let segment = &values[first..last.max(first)];

            if segment.len() < min_points {
                debug!(
                    "Dropping cycle [{:.4}, {:.4}) with {} samples",
                    start,
                    end,
                    segment.len()
                );
                continue;
            }

            let (min, max) = segment
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });

            cycles.push(Cycle {
                index: cycles.len() + 1,
                start,
                end,
                mean: mean(segment),
                amplitude: 0.5 * (max - min),
                samples: segment.len(),
            });
        }

        if cycles.is_empty() {
            return Err(ProcessError::NoQualifyingCycles {
                candidates: crossing_times.len() - 1,
                min_points,
            });
        }

        debug!(
            "Segmented {} cycles from {} crossings (level {:.6})",
            cycles.len(),
            crossing_times.len(),
            level
        );

        Ok(CycleSet {
            cycles,
            crossing_times,
            level,
        })
    }
}

/// Interpolated times where `values - level` goes from <= 0 to > 0
pub fn up_crossings(time: &[f64], values: &[f64], level: f64) -> Vec<f64> {
    let n = time.len().min(values.len());
    let mut crossings = Vec::new();

    for i in 1..n {
        let y1 = values[i - 1] - level;
        let y2 = values[i] - level;
        if y1 <= 0.0 && y2 > 0.0 {
            let (t1, t2) = (time[i - 1], time[i]);
            let frac = if y2 != y1 { -y1 / (y2 - y1) } else { 0.0 };
            crossings.push(t1 + (t2 - t1) * frac);
        }
    }

    crossings
}
