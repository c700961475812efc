//! Time-History Text Output
//!
//! Writes synthetic records in the column layout the solver produces and
//! [`seakeep_core::ingest::TimeHistoryParser`] reads back:
//!
//! ```text
//! 船舶运动时间历程 (synthetic)
//! 有义波高: 5.500000E+00 m
//!         time        channel1        channel2 ...
//!      0.00000    1.234560E+00    ...
//! ```
//!
//! Rows can be replaced with `*` runs to imitate Fortran field overflow.

use seakeep_core::ingest::WAVE_HEIGHT_LABEL;
use seakeep_core::types::{ProcessError, ProcessResult};
use std::fmt::Write as _;
use std::path::Path;

/// Time-history text writer
#[derive(Debug, Clone)]
pub struct HistoryWriter {
    title: String,
    wave_height: Option<f64>,
    column_names: Vec<String>,
    /// Every n-th data row is written as an overflow row
    overflow_every: Option<usize>,
}

impl HistoryWriter {
    pub fn new(title: &str, column_names: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            wave_height: None,
            column_names: column_names.iter().map(|s| s.to_string()).collect(),
            overflow_every: None,
        }
    }

    /// Builder: add the significant wave height header line
    pub fn with_wave_height(mut self, hs: f64) -> Self {
        self.wave_height = Some(hs);
        self
    }

    /// Builder: corrupt every `n`-th row with an overflow field
    pub fn with_overflow_every(mut self, n: usize) -> Self {
        self.overflow_every = (n > 0).then_some(n);
        self
    }

    /// Render time plus channels (one slice per column after time)
    pub fn to_text(&self, time: &[f64], channels: &[&[f64]]) -> ProcessResult<String> {
        if let Some(bad) = channels.iter().find(|c| c.len() != time.len()) {
            return Err(ProcessError::LengthMismatch {
                time: time.len(),
                values: bad.len(),
            });
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        if let Some(hs) = self.wave_height {
            let _ = writeln!(out, "{}: {:.6E} m", WAVE_HEIGHT_LABEL, hs);
        }
        let _ = write!(out, "{:>12}", "time");
        for name in &self.column_names {
            let _ = write!(out, " {:>15}", name);
        }
        out.push('\n');

        for (i, &t) in time.iter().enumerate() {
            let _ = write!(out, "{:>12.5}", t);
            let overflow = self.overflow_every.map_or(false, |n| i > 0 && i % n == 0);
            for (c, channel) in channels.iter().enumerate() {
                if overflow && c == 0 {
                    let _ = write!(out, " {:>15}", "***************");
                } else {
                    let _ = write!(out, " {:>15.6E}", channel[i]);
                }
            }
            out.push('\n');
        }

        Ok(out)
    }

    /// Render and write to `path`
    pub fn write_file(&self, path: &Path, time: &[f64], channels: &[&[f64]]) -> std::io::Result<()> {
        let text = self
            .to_text(time, channels)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        std::fs::write(path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seakeep_core::ingest::{header_value, TimeHistoryParser};

    #[test]
    fn test_written_history_parses_back() {
        let time: Vec<f64> = (0..10).map(|i| i as f64 * 0.1).collect();
        let a: Vec<f64> = time.iter().map(|t| t * 2.0).collect();
        let b: Vec<f64> = time.iter().map(|t| -t).collect();

        let text = HistoryWriter::new("test", &["a", "b"])
            .with_wave_height(5.5)
            .to_text(&time, &[&a, &b])
            .unwrap();

        assert_eq!(header_value(&text, WAVE_HEIGHT_LABEL), Some(5.5));
        let history = TimeHistoryParser::new(vec![1, 2]).parse(&text).unwrap();
        assert_eq!(history.len(), 10);
        let b_back = &history.channels[1].values;
        assert!((b_back[9] + 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_overflow_rows_are_skipped_on_read() {
        let time: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let a = vec![1.0; 12];
        let text = HistoryWriter::new("test", &["a"])
            .with_overflow_every(4)
            .to_text(&time, &[&a])
            .unwrap();
        let history = TimeHistoryParser::default().parse(&text).unwrap();
        // Rows 4 and 8 carry the overflow marker
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn test_length_mismatch() {
        let err = HistoryWriter::new("t", &["a"])
            .to_text(&[0.0, 1.0], &[&[1.0]])
            .unwrap_err();
        assert!(matches!(err, ProcessError::LengthMismatch { .. }));
    }
}
