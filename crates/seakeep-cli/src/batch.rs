//! Batch processing of solver output directories.

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use seakeep_core::analysis::{rao, wave_length, wave_length_ratio, SteadyStateAnalyzer};
use seakeep_core::ingest::{header_value, last_number, TimeHistoryParser, WAVE_HEIGHT_LABEL};
use seakeep_core::types::GRAVITY;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Recursively find `.txt` files whose name contains `pattern`
pub fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .with_context(|| format!("reading directory {}", current.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let is_txt = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| e.eq_ignore_ascii_case("txt"));
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.contains(pattern));
            if is_txt && matches {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Apply `f` to every file, dropping failures with a warning
pub fn process_all<T, F>(files: &[PathBuf], parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync,
{
    let run = |path: &PathBuf| match f(path.as_path()) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping {}: {:#}", path.display(), e);
            None
        }
    };

    if parallel {
        files.par_iter().filter_map(run).collect()
    } else {
        files.iter().filter_map(run).collect()
    }
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn frequency_of(path: &Path) -> Result<f64> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(last_number)
        .ok_or_else(|| anyhow!("no frequency in file name"))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Steady added resistance of one run
#[derive(Debug, Clone, Serialize)]
pub struct ResistanceRecord {
    pub file: String,
    pub omega: f64,
    pub lambda: f64,
    pub lambda_over_l: f64,
    pub conv_mean: f64,
    pub conv_amp: f64,
    pub conv_start_cycle: usize,
    pub n_cycles: usize,
    pub period_est: Option<f64>,
    /// Per-file steady-state report
    #[serde(skip)]
    pub report: String,
}

pub fn process_resistance(
    path: &Path,
    column: usize,
    analyzer: &SteadyStateAnalyzer,
    ship_length: f64,
) -> Result<ResistanceRecord> {
    let omega = frequency_of(path)?;
    let text = read_text(path)?;
    let series = TimeHistoryParser::new(vec![column])
        .parse(&text)?
        .channel(column)
        .ok_or_else(|| anyhow!("column {} not read", column))?;
    let steady = analyzer.analyze(&series)?;

    info!(
        "{}: omega {:.4}, mean {:.6e} from cycle {} of {}",
        file_label(path),
        omega,
        steady.mean(),
        steady.convergence.start_cycle(),
        steady.cycles.len()
    );

    Ok(ResistanceRecord {
        file: file_label(path),
        omega,
        lambda: wave_length(omega, GRAVITY),
        lambda_over_l: wave_length_ratio(omega, ship_length),
        conv_mean: steady.mean(),
        conv_amp: steady.amplitude(),
        conv_start_cycle: steady.convergence.start_cycle(),
        n_cycles: steady.cycles.len(),
        period_est: steady.estimated_period(),
        report: steady.to_text(),
    })
}

/// Heave and pitch response of one run
#[derive(Debug, Clone, Serialize)]
pub struct MotionRecord {
    pub file: String,
    pub omega: f64,
    pub lambda: f64,
    pub lambda_over_l: f64,
    pub wave_height: f64,
    pub heave_amp: f64,
    pub pitch_amp: f64,
    pub heave_rao: f64,
    pub pitch_rao: f64,
}

pub struct MotionColumns {
    pub heave: usize,
    pub pitch: usize,
}

pub fn process_motion(
    path: &Path,
    columns: &MotionColumns,
    analyzer: &SteadyStateAnalyzer,
    ship_length: f64,
    wave_height: Option<f64>,
) -> Result<MotionRecord> {
    let omega = frequency_of(path)?;
    let text = read_text(path)?;

    let hs = match wave_height.or_else(|| header_value(&text, WAVE_HEIGHT_LABEL)) {
        Some(hs) => hs,
        None => {
            warn!("{}: no wave height in header, using 1.0 m", file_label(path));
            1.0
        }
    };

    let history = TimeHistoryParser::new(vec![columns.heave, columns.pitch]).parse(&text)?;
    let amplitude_of = |column: usize, name: &str| {
        let result = history
            .channel(column)
            .ok_or_else(|| anyhow!("column {} not read", column))
            .and_then(|series| Ok(analyzer.analyze(&series)?));
        match result {
            Ok(steady) => steady.amplitude(),
            Err(e) => {
                warn!("{}: {} channel failed ({:#}), reporting 0", file_label(path), name, e);
                0.0
            }
        }
    };
    let heave_amp = amplitude_of(columns.heave, "heave");
    let pitch_amp = amplitude_of(columns.pitch, "pitch");

    info!(
        "{}: omega {:.4}, heave {:.4e}, pitch {:.4e}",
        file_label(path),
        omega,
        heave_amp,
        pitch_amp
    );

    Ok(MotionRecord {
        file: file_label(path),
        omega,
        lambda: wave_length(omega, GRAVITY),
        lambda_over_l: wave_length_ratio(omega, ship_length),
        wave_height: hs,
        heave_amp,
        pitch_amp,
        heave_rao: rao(heave_amp, hs),
        pitch_rao: rao(pitch_amp, hs),
    })
}

pub fn sort_resistance(records: &mut [ResistanceRecord]) {
    records.sort_by(|a, b| a.lambda_over_l.total_cmp(&b.lambda_over_l));
}

pub fn sort_motion(records: &mut [MotionRecord]) {
    records.sort_by(|a, b| a.lambda_over_l.total_cmp(&b.lambda_over_l));
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

pub fn resistance_csv(records: &[ResistanceRecord]) -> String {
    let mut out = String::from(
        "file,omega,lambda,lambda/L,conv_mean,conv_amp,conv_start_cycle,n_cycles,period_est\n",
    );
    for r in records {
        out.push_str(&format!(
            "{},{:.6},{:.6},{:.6},{:.6e},{:.6e},{},{},{}\n",
            r.file,
            r.omega,
            r.lambda,
            r.lambda_over_l,
            r.conv_mean,
            r.conv_amp,
            r.conv_start_cycle,
            r.n_cycles,
            opt(r.period_est)
        ));
    }
    out
}

pub fn resistance_text(records: &[ResistanceRecord]) -> String {
    let mut out = String::new();
    out.push_str("Added Resistance Summary\n");
    out.push_str(&format!("{}\n", "═".repeat(50)));
    out.push_str(&format!(
        "{:>8} {:>10} {:>8} {:>14} {:>14} {:>6} {:>6} {:>10}\n",
        "omega", "lambda", "λ/L", "mean", "amplitude", "start", "cycles", "period"
    ));
    out.push_str(&format!("{}\n", "─".repeat(50)));
    for r in records {
        out.push_str(&format!(
            "{:>8.4} {:>10.3} {:>8.4} {:>14.6e} {:>14.6e} {:>6} {:>6} {:>10}\n",
            r.omega,
            r.lambda,
            r.lambda_over_l,
            r.conv_mean,
            r.conv_amp,
            r.conv_start_cycle,
            r.n_cycles,
            r.period_est.map(|p| format!("{:.3}", p)).unwrap_or_else(|| "-".to_string())
        ));
    }
    out.push_str(&format!("{} runs\n", records.len()));
    out
}

/// Full steady-state report for every run, in summary order
pub fn resistance_detail(records: &[ResistanceRecord]) -> String {
    let mut out = String::new();
    for r in records {
        out.push_str(&format!("{} (omega {:.4})\n", r.file, r.omega));
        out.push_str(&r.report);
        out.push('\n');
    }
    out
}

pub fn motion_csv(records: &[MotionRecord]) -> String {
    let mut out = String::from(
        "file,omega,lambda,lambda/L,wave_height,heave_amp,pitch_amp,heave_rao,pitch_rao\n",
    );
    for r in records {
        out.push_str(&format!(
            "{},{:.6},{:.6},{:.6},{:.6},{:.6e},{:.6e},{:.6},{:.6}\n",
            r.file,
            r.omega,
            r.lambda,
            r.lambda_over_l,
            r.wave_height,
            r.heave_amp,
            r.pitch_amp,
            r.heave_rao,
            r.pitch_rao
        ));
    }
    out
}

pub fn motion_text(records: &[MotionRecord]) -> String {
    let mut out = String::new();
    out.push_str("Motion RAO Summary\n");
    out.push_str(&format!("{}\n", "═".repeat(50)));
    out.push_str(&format!(
        "{:>8} {:>10} {:>8} {:>8} {:>12} {:>12} {:>10} {:>10}\n",
        "omega", "lambda", "λ/L", "Hs", "heave", "pitch", "heave RAO", "pitch RAO"
    ));
    out.push_str(&format!("{}\n", "─".repeat(50)));
    for r in records {
        out.push_str(&format!(
            "{:>8.4} {:>10.3} {:>8.4} {:>8.3} {:>12.4e} {:>12.4e} {:>10.4} {:>10.4}\n",
            r.omega,
            r.lambda,
            r.lambda_over_l,
            r.wave_height,
            r.heave_amp,
            r.pitch_amp,
            r.heave_rao,
            r.pitch_rao
        ));
    }
    out.push_str(&format!("{} runs\n", records.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use seakeep_core::config::AnalysisConfig;
    use seakeep_sim::{RunKind, ShipModel, SyntheticRun};
    use tempfile::tempdir;

    fn write_runs(dir: &Path, kind: RunKind, omegas: &[f64]) {
        for (i, &omega) in omegas.iter().enumerate() {
            let run = SyntheticRun::new(kind, omega, ShipModel::default());
            std::fs::write(dir.join(run.file_name()), run.to_text(i as u64).unwrap()).unwrap();
        }
    }

    #[test]
    fn test_discover_filters_and_recurses() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("时间历程_w0.3.txt"), "").unwrap();
        std::fs::write(nested.join("时间历程_w0.4.TXT"), "").unwrap();
        std::fs::write(dir.path().join("时间历程_w0.5.csv"), "").unwrap();
        std::fs::write(dir.path().join("other_w0.6.txt"), "").unwrap();

        let files = discover(dir.path(), "时间历程").unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_resistance_batch_sorted_by_wavelength_ratio() {
        let dir = tempdir().unwrap();
        write_runs(dir.path(), RunKind::Resistance, &[0.3, 0.6, 0.45]);
        std::fs::write(dir.path().join("船舶波浪增阻时间历程_broken.txt"), "no data\n").unwrap();

        let files = discover(dir.path(), "时间历程").unwrap();
        assert_eq!(files.len(), 4);

        let analyzer = SteadyStateAnalyzer::new(AnalysisConfig::resistance());
        let mut records =
            process_all(&files, true, |p| process_resistance(p, 1, &analyzer, 325.5));
        sort_resistance(&mut records);

        assert_eq!(records.len(), 3);
        let omegas: Vec<f64> = records.iter().map(|r| r.omega).collect();
        assert_eq!(omegas, vec![0.6, 0.45, 0.3]);
        assert!(records.windows(2).all(|w| w[0].lambda_over_l <= w[1].lambda_over_l));

        let ship = ShipModel::default();
        for r in &records {
            let expected = ship.mean_resistance(r.omega);
            assert!((r.conv_mean - expected).abs() < 0.02 * (1.4 * expected + 1.0));
        }
        assert!(resistance_csv(&records).starts_with("file,omega,lambda,lambda/L,conv_mean"));
    }

    #[test]
    fn test_resistance_detail_lists_every_run() {
        let dir = tempdir().unwrap();
        write_runs(dir.path(), RunKind::Resistance, &[0.3, 0.5]);
        let files = discover(dir.path(), "时间历程").unwrap();

        let analyzer = SteadyStateAnalyzer::new(AnalysisConfig::resistance());
        let mut records =
            process_all(&files, false, |p| process_resistance(p, 1, &analyzer, 325.5));
        sort_resistance(&mut records);

        let detail = resistance_detail(&records);
        assert_eq!(detail.matches("Steady State").count(), 2);
        assert_eq!(detail.matches("Channel Statistics").count(), 2);
        let first = detail.find(&records[0].file).unwrap();
        let second = detail.find(&records[1].file).unwrap();
        assert!(first < second);
        assert!(detail.contains(&format!("Converged From:    cycle {}", records[0].conv_start_cycle)));

        // The report stays out of the JSON summary
        let json = serde_json::to_string(&records).unwrap();
        assert!(!json.contains("report"));
    }

    #[test]
    fn test_motion_reads_wave_height_from_header() {
        let dir = tempdir().unwrap();
        write_runs(dir.path(), RunKind::Motion, &[0.4]);
        let files = discover(dir.path(), "运动").unwrap();

        let analyzer = SteadyStateAnalyzer::new(AnalysisConfig::motion());
        let columns = MotionColumns { heave: 3, pitch: 5 };
        let record = process_motion(&files[0], &columns, &analyzer, 325.5, None).unwrap();

        let ship = ShipModel::default();
        assert!((record.wave_height - ship.wave_height).abs() < 1e-9);
        assert!((record.heave_rao - ship.heave_rao(0.4)).abs() < 0.02);
        assert!((record.pitch_rao - ship.pitch_rao(0.4)).abs() < 0.02);
    }

    #[test]
    fn test_motion_failing_channel_reports_zero() {
        let dir = tempdir().unwrap();
        write_runs(dir.path(), RunKind::Motion, &[0.4]);
        let files = discover(dir.path(), "运动").unwrap();

        let analyzer = SteadyStateAnalyzer::new(AnalysisConfig::motion());
        // Column 2 (sway) never oscillates
        let columns = MotionColumns { heave: 3, pitch: 2 };
        let record = process_motion(&files[0], &columns, &analyzer, 325.5, Some(4.0)).unwrap();
        assert_eq!(record.pitch_amp, 0.0);
        assert_eq!(record.wave_height, 4.0);
        assert!(record.heave_amp > 0.0);
    }
}
