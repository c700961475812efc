//! Synthetic runs through the whole pipeline: text → ingest → steady state
//! → frequency table → spectral aggregation.

use seakeep_core::analysis::{rao, SteadyStateAnalyzer};
use seakeep_core::config::{AnalysisConfig, ColumnRoles, ConventionChoice};
use seakeep_core::ingest::{header_value, last_number, TableParser, TimeHistoryParser};
use seakeep_core::spectral::{
    EncounterMapping, FrequencyConvention, FrequencyNodes, IttcSpectrum, SpectralAggregator,
};
use seakeep_sim::{RunKind, ShipModel, SyntheticRun, WAVE_HEIGHT_LABEL};

fn frequencies() -> Vec<f64> {
    (0..21).map(|i| 0.2 + 0.05 * i as f64).collect()
}

fn stem(run: &SyntheticRun) -> String {
    run.file_name().trim_end_matches(".txt").to_string()
}

#[test]
fn test_resistance_runs_recover_mean() {
    let ship = ShipModel::default();
    let analyzer = SteadyStateAnalyzer::new(AnalysisConfig::resistance());
    let parser = TimeHistoryParser::new(vec![1]);

    for (i, omega) in frequencies().into_iter().enumerate() {
        let run = SyntheticRun::new(RunKind::Resistance, omega, ship.clone()).with_overflow_every(97);
        let text = run.to_text(i as u64).unwrap();

        let key = last_number(&stem(&run)).unwrap();
        assert!((key - omega).abs() < 1e-3);

        let series = parser.parse(&text).unwrap().channel(1).unwrap();
        let steady = analyzer.analyze(&series).unwrap();

        let expected = ship.mean_resistance(omega);
        let scale = expected + 0.4 * expected + 1.0;
        assert!(
            (steady.mean() - expected).abs() < 0.02 * scale,
            "omega {:.2}: mean {} expected {}",
            omega,
            steady.mean(),
            expected
        );
        assert!(steady.estimated_period().is_some());
    }
}

#[test]
fn test_motion_runs_recover_raos() {
    let ship = ShipModel::default();
    let analyzer = SteadyStateAnalyzer::new(AnalysisConfig::motion());
    let parser = TimeHistoryParser::new(vec![3, 5]);

    for (i, omega) in frequencies().into_iter().enumerate() {
        let run = SyntheticRun::new(RunKind::Motion, omega, ship.clone());
        let text = run.to_text(100 + i as u64).unwrap();
        let hs = header_value(&text, WAVE_HEIGHT_LABEL).unwrap();
        assert!((hs - ship.wave_height).abs() < 1e-9);

        let history = parser.parse(&text).unwrap();
        let heave = analyzer.analyze(&history.channel(3).unwrap()).unwrap();
        let pitch = analyzer.analyze(&history.channel(5).unwrap()).unwrap();

        let heave_rao = rao(heave.amplitude(), hs);
        let pitch_rao = rao(pitch.amplitude(), hs);
        assert!(
            (heave_rao - ship.heave_rao(omega)).abs() < 0.01 + 0.02 * ship.heave_rao(omega),
            "omega {:.2}: heave RAO {} expected {}",
            omega,
            heave_rao,
            ship.heave_rao(omega)
        );
        assert!(
            (pitch_rao - ship.pitch_rao(omega)).abs() < 0.01 + 0.02 * ship.pitch_rao(omega),
            "omega {:.2}: pitch RAO {} expected {}",
            omega,
            pitch_rao,
            ship.pitch_rao(omega)
        );
    }
}

#[test]
fn test_extracted_table_aggregates_like_transfer_functions() {
    let ship = ShipModel::default();
    let resistance = SteadyStateAnalyzer::new(AnalysisConfig::resistance());
    let motion = SteadyStateAnalyzer::new(AnalysisConfig::motion());

    let mut csv = String::from("omega(rad/s),平均增阻,垂荡RAO,纵摇RAO\n");
    for (i, omega) in frequencies().into_iter().enumerate() {
        let res_text = SyntheticRun::new(RunKind::Resistance, omega, ship.clone())
            .to_text(i as u64)
            .unwrap();
        let res_series = TimeHistoryParser::new(vec![1])
            .parse(&res_text)
            .unwrap()
            .channel(1)
            .unwrap();
        let mean = resistance.analyze(&res_series).unwrap().mean();

        let mot_text = SyntheticRun::new(RunKind::Motion, omega, ship.clone())
            .to_text(i as u64)
            .unwrap();
        let history = TimeHistoryParser::new(vec![3, 5]).parse(&mot_text).unwrap();
        let heave = motion.analyze(&history.channel(3).unwrap()).unwrap().amplitude();
        let pitch = motion.analyze(&history.channel(5).unwrap()).unwrap().amplitude();

        csv.push_str(&format!(
            "{},{},{},{}\n",
            omega,
            mean,
            rao(heave, ship.wave_height),
            rao(pitch, ship.wave_height)
        ));
    }

    let table = TableParser::new(ColumnRoles::default()).parse(&csv).unwrap();
    assert_eq!(table.len(), 21);
    assert_eq!(table.amplitude_names, vec!["heave".to_string(), "pitch".to_string()]);
    let nodes = FrequencyNodes::new(table.to_nodes()).unwrap();

    // Reference: the same quadrature over the exact transfer functions
    let exact = FrequencyNodes::new(
        frequencies()
            .into_iter()
            .map(|omega| seakeep_core::spectral::FrequencyNode {
                frequency: omega,
                mean_response: ship.mean_resistance(omega),
                amplitudes: vec![ship.heave_rao(omega), ship.pitch_rao(omega)],
            })
            .collect(),
    )
    .unwrap();

    let spectrum = IttcSpectrum::new(4.0, 10.0).unwrap();
    let aggregator = SpectralAggregator::new(spectrum, EncounterMapping::new(ship.speed_ms, ship.heading_deg));

    let measured = aggregator.decide(&nodes, ConventionChoice::Absolute).unwrap();
    let reference = aggregator.decide(&exact, ConventionChoice::Absolute).unwrap();

    assert_eq!(measured.chosen, FrequencyConvention::Absolute);
    let got = measured.chosen_scenario();
    let want = reference.chosen_scenario();
    assert!(
        (got.mean_response - want.mean_response).abs() < 0.02 * want.mean_response,
        "mean response {} vs {}",
        got.mean_response,
        want.mean_response
    );
    for ch in 0..2 {
        let (g, w) = (got.significant(ch).unwrap(), want.significant(ch).unwrap());
        assert!((g - w).abs() < 0.03 * w, "channel {}: {} vs {}", ch, g, w);
    }

    // Both readings are always computed; the wave moment is independent of the responses
    assert_eq!(measured.absolute.m0_eta, reference.absolute.m0_eta);
    assert!(measured.encounter.m0_eta > 0.0);
}
