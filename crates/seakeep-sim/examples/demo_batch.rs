//! Synthetic Batch Generator
//!
//! Writes a sweep of resistance and motion time histories plus an irregular
//! sea record, then runs the steady-state extraction on each run.
//!
//! Run with: cargo run --example demo_batch -p seakeep-sim

use seakeep_core::analysis::{rao, wave_length_ratio, SteadyStateAnalyzer};
use seakeep_core::config::AnalysisConfig;
use seakeep_core::ingest::TimeHistoryParser;
use seakeep_core::spectral::{EncounterMapping, IttcSpectrum};
use seakeep_sim::{HistoryWriter, IrregularSea, RunKind, ShipModel, SyntheticRun};
use std::fs;
use std::path::Path;

const OUTPUT_DIR: &str = "demo_runs";

fn main() {
    println!("Seakeep Synthetic Batch");
    println!("=======================\n");

    let dir = Path::new(OUTPUT_DIR);
    fs::create_dir_all(dir).expect("Failed to create directory");

    let ship = ShipModel::default();
    let resistance = SteadyStateAnalyzer::new(AnalysisConfig::resistance());
    let motion = SteadyStateAnalyzer::new(AnalysisConfig::motion());

    println!(
        "{:>8} {:>8} {:>12} {:>12} {:>10} {:>10}",
        "omega", "λ/L", "R mean", "R expected", "heave", "pitch"
    );
    for (i, omega) in (0..13).map(|i| (i, 0.2 + 0.075 * i as f64)) {
        let res_run = SyntheticRun::new(RunKind::Resistance, omega, ship.clone());
        let res_text = res_run.to_text(i).expect("resistance run");
        fs::write(dir.join(res_run.file_name()), &res_text).expect("write resistance file");

        let mot_run = SyntheticRun::new(RunKind::Motion, omega, ship.clone()).with_overflow_every(50);
        let mot_text = mot_run.to_text(i).expect("motion run");
        fs::write(dir.join(mot_run.file_name()), &mot_text).expect("write motion file");

        let series = TimeHistoryParser::new(vec![1])
            .parse(&res_text)
            .expect("parse")
            .channel(1)
            .expect("column 1");
        let mean = resistance.analyze(&series).expect("analyze").mean();

        let history = TimeHistoryParser::new(vec![3, 5]).parse(&mot_text).expect("parse");
        let heave = motion.analyze(&history.channel(3).expect("heave")).expect("analyze");
        let pitch = motion.analyze(&history.channel(5).expect("pitch")).expect("analyze");

        println!(
            "{:>8.3} {:>8.3} {:>12.3} {:>12.3} {:>10.4} {:>10.4}",
            omega,
            wave_length_ratio(omega, ship.length),
            mean,
            ship.mean_resistance(omega),
            rao(heave.amplitude(), ship.wave_height),
            rao(pitch.amplitude(), ship.wave_height),
        );
    }

    // Irregular sea seen from the moving ship
    let spectrum = IttcSpectrum::new(5.5, 9.0).expect("spectrum");
    let sea = IrregularSea::with_seed(&spectrum, 0.2, 2.5, 300, 7)
        .with_encounter(&EncounterMapping::new(ship.speed_ms, ship.heading_deg));
    let record = sea.generate(0.5, 7200).expect("record");
    HistoryWriter::new("irregular sea (synthetic)", &["elevation"])
        .with_wave_height(spectrum.hs)
        .write_file(&dir.join("irregular_sea.txt"), record.time(), &[record.values()])
        .expect("write irregular record");

    println!("\nFiles written to: {}/", OUTPUT_DIR);
}
