//! Seakeeping Post-Processing Command-Line Interface
//!
//! This CLI provides tools for:
//! - Extracting steady added resistance from a directory of time histories
//! - Extracting heave and pitch RAOs from motion time histories
//! - Aggregating per-frequency results over an irregular sea
//! - Generating synthetic time histories to try the pipeline on

mod batch;
mod table;

use anyhow::{bail, Context, Result};
use batch::{MotionColumns, MotionRecord, ResistanceRecord};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use seakeep_core::analysis::SteadyStateAnalyzer;
use seakeep_core::config::{
    AnalysisConfig, ConventionChoice, PeriodKind, ProjectConfig, SeaStateConfig, SpeedUnit,
    TailPolicy,
};
use seakeep_core::ingest::TableParser;
use seakeep_core::spectral::{EncounterMapping, FrequencyNodes, IttcSpectrum, SpectralAggregator};
use seakeep_sim::{ResponseModel, RunKind, ShipModel, SyntheticRun};
use std::path::{Path, PathBuf};
use table::{SummaryRow, SummaryTable};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "seakeep")]
#[command(author, version, about = "Seakeeping steady-state and RAO aggregation CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Steady mean added resistance for every run in a directory
    Resistance {
        /// Directory searched recursively for time histories
        #[arg(short, long)]
        dir: PathBuf,

        /// Only files whose name contains this text
        #[arg(long, default_value = "时间历程")]
        pattern: String,

        /// Resistance column (0 is time)
        #[arg(long, default_value = "1")]
        column: usize,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ship length in metres for λ/L
        #[arg(long)]
        ship_length: Option<f64>,

        /// Summary CSV to upsert (omega, mean, amplitude) rows into
        #[arg(long)]
        table: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text, json, csv, detail)
        #[arg(long, default_value = "text")]
        output_format: String,

        /// Process files in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Heave and pitch RAOs for every run in a directory
    Motion {
        /// Directory searched recursively for time histories
        #[arg(short, long)]
        dir: PathBuf,

        /// Only files whose name contains this text
        #[arg(long, default_value = "时间历程")]
        pattern: String,

        /// Heave column (0 is time)
        #[arg(long, default_value = "3")]
        heave_column: usize,

        /// Pitch column (0 is time)
        #[arg(long, default_value = "5")]
        pitch_column: usize,

        /// Significant wave height, overriding the file header
        #[arg(long)]
        wave_height: Option<f64>,

        /// Tail policy (scan, fixed, fixed:N)
        #[arg(long)]
        policy: Option<String>,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ship length in metres for λ/L
        #[arg(long)]
        ship_length: Option<f64>,

        /// Summary CSV to upsert (omega, heave RAO, pitch RAO) rows into
        #[arg(long)]
        table: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (text, json, csv)
        #[arg(long, default_value = "text")]
        output_format: String,

        /// Process files in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Aggregate a per-frequency table over an ITTC sea state
    #[command(allow_negative_numbers = true)]
    Aggregate {
        /// Table with frequency, mean response and amplitude columns
        #[arg(short, long)]
        input: PathBuf,

        /// YAML configuration file (sea state and column roles)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Significant wave height in metres
        #[arg(long)]
        hs: Option<f64>,

        /// Wave period in seconds
        #[arg(long)]
        period: Option<f64>,

        /// Meaning of --period (tp, tz)
        #[arg(long)]
        period_kind: Option<String>,

        /// Tp/Tz ratio used with --period-kind tz
        #[arg(long)]
        tp_over_tz: Option<f64>,

        /// Forward speed
        #[arg(long)]
        speed: Option<f64>,

        /// Unit of --speed (kn, ms)
        #[arg(long)]
        speed_unit: Option<String>,

        /// Wave heading in degrees (180 = head seas)
        #[arg(long)]
        heading: Option<f64>,

        /// Frequency convention of the table (auto, abs, enc)
        #[arg(long)]
        convention: Option<String>,

        /// Write per-node contributions of the chosen reading to this CSV
        #[arg(long)]
        details: Option<PathBuf>,

        /// Number of top contributors in the report
        #[arg(long, default_value = "20")]
        top: usize,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        output_format: String,
    },

    /// Write synthetic time histories
    Synth {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Run kind (resistance, motion)
        #[arg(long, default_value = "resistance")]
        kind: String,

        /// Comma-separated wave frequencies in rad/s
        #[arg(long, default_value = "0.2,0.3,0.4,0.5,0.6,0.7,0.8,0.9,1.0,1.1,1.2")]
        frequencies: String,

        /// Response model (ideal, transient, noisy)
        #[arg(long, default_value = "transient")]
        model: String,

        /// Noise standard deviation
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Forward speed in m/s
        #[arg(long, default_value = "7.7")]
        speed: f64,

        /// Regular wave height in metres
        #[arg(long, default_value = "2.0")]
        wave_height: f64,

        /// Write every n-th row as a field overflow
        #[arg(long)]
        overflow_every: Option<usize>,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Print a configuration template
    Config {
        /// Analysis preset (default, resistance, motion)
        #[arg(long, default_value = "default")]
        preset: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_config(path: &Option<PathBuf>) -> Result<Option<ProjectConfig>> {
    match path {
        Some(path) => {
            let config = ProjectConfig::load_from(path)?;
            config
                .validate()
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

fn parse_policy(policy: &str) -> Result<TailPolicy> {
    TailPolicy::from_str(policy)
        .with_context(|| format!("unknown tail policy '{}' (scan, fixed, fixed:N)", policy))
}

/// Analysis settings from the config file or a preset, with CLI overrides applied
fn analysis_config(
    config: Option<&ProjectConfig>,
    preset: fn() -> AnalysisConfig,
    policy: Option<&str>,
) -> Result<AnalysisConfig> {
    let mut analysis = config.map(|c| c.analysis.clone()).unwrap_or_else(preset);
    if let Some(policy) = policy {
        analysis.convergence.tail_policy = parse_policy(policy)?;
    }
    analysis.validate().context("invalid analysis settings")?;
    Ok(analysis)
}

fn emit(text: &str, output: &Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("Results written to {:?}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn discover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let files = batch::discover(dir, pattern)?;
    if files.is_empty() {
        bail!("No .txt files containing '{}' under {}", pattern, dir.display());
    }
    info!("Found {} files under {}", files.len(), dir.display());
    Ok(files)
}

struct ResistanceArgs {
    dir: PathBuf,
    pattern: String,
    column: usize,
    config: Option<PathBuf>,
    ship_length: Option<f64>,
    table: Option<PathBuf>,
    output: Option<PathBuf>,
    output_format: String,
    parallel: bool,
}

fn cmd_resistance(args: ResistanceArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let analysis = analysis_config(config.as_ref(), AnalysisConfig::resistance, None)?;
    let ship_length = args
        .ship_length
        .or_else(|| config.as_ref().map(|c| c.ship.length))
        .unwrap_or(ProjectConfig::default().ship.length);

    let files = discover_files(&args.dir, &args.pattern)?;
    let analyzer = SteadyStateAnalyzer::new(analysis);
    let mut records: Vec<ResistanceRecord> = batch::process_all(&files, args.parallel, |path| {
        batch::process_resistance(path, args.column, &analyzer, ship_length)
    });
    batch::sort_resistance(&mut records);

    if records.len() < files.len() {
        warn!("{} of {} files skipped", files.len() - records.len(), files.len());
    }
    if records.is_empty() {
        bail!("No file could be processed");
    }

    if let Some(table_path) = &args.table {
        let rows = records
            .iter()
            .map(|r| SummaryRow::new(format!("{}", r.omega), &[r.conv_mean, r.conv_amp]))
            .collect();
        let table = SummaryTable::merge_into(table_path, &["omega", "mean", "amplitude"], rows)?;
        info!("Summary table {} now has {} rows", table_path.display(), table.rows.len());
    }

    let text = match args.output_format.as_str() {
        "json" => serde_json::to_string_pretty(&records)?,
        "csv" => batch::resistance_csv(&records),
        "detail" => batch::resistance_detail(&records),
        _ => batch::resistance_text(&records),
    };
    emit(&text, &args.output)
}

struct MotionArgs {
    dir: PathBuf,
    pattern: String,
    heave_column: usize,
    pitch_column: usize,
    wave_height: Option<f64>,
    policy: Option<String>,
    config: Option<PathBuf>,
    ship_length: Option<f64>,
    table: Option<PathBuf>,
    output: Option<PathBuf>,
    output_format: String,
    parallel: bool,
}

fn cmd_motion(args: MotionArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let analysis =
        analysis_config(config.as_ref(), AnalysisConfig::motion, args.policy.as_deref())?;
    let ship_length = args
        .ship_length
        .or_else(|| config.as_ref().map(|c| c.ship.length))
        .unwrap_or(ProjectConfig::default().ship.length);

    let files = discover_files(&args.dir, &args.pattern)?;
    let analyzer = SteadyStateAnalyzer::new(analysis);
    let columns = MotionColumns {
        heave: args.heave_column,
        pitch: args.pitch_column,
    };
    let mut records: Vec<MotionRecord> = batch::process_all(&files, args.parallel, |path| {
        batch::process_motion(path, &columns, &analyzer, ship_length, args.wave_height)
    });
    batch::sort_motion(&mut records);

    if records.is_empty() {
        bail!("No file could be processed");
    }

    if let Some(table_path) = &args.table {
        let rows = records
            .iter()
            .map(|r| SummaryRow::new(format!("{}", r.omega), &[r.heave_rao, r.pitch_rao]))
            .collect();
        let table =
            SummaryTable::merge_into(table_path, &["omega", "heave_rao", "pitch_rao"], rows)?;
        info!("Summary table {} now has {} rows", table_path.display(), table.rows.len());
    }

    let text = match args.output_format.as_str() {
        "json" => serde_json::to_string_pretty(&records)?,
        "csv" => batch::motion_csv(&records),
        _ => batch::motion_text(&records),
    };
    emit(&text, &args.output)
}

struct AggregateArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    hs: Option<f64>,
    period: Option<f64>,
    period_kind: Option<String>,
    tp_over_tz: Option<f64>,
    speed: Option<f64>,
    speed_unit: Option<String>,
    heading: Option<f64>,
    convention: Option<String>,
    details: Option<PathBuf>,
    top: usize,
    output_format: String,
}

fn sea_state_from(args: &AggregateArgs, base: SeaStateConfig) -> Result<SeaStateConfig> {
    let mut sea = base;
    if let Some(hs) = args.hs {
        sea.significant_height = hs;
    }
    if let Some(period) = args.period {
        sea.period = period;
    }
    if let Some(kind) = &args.period_kind {
        sea.period_kind = PeriodKind::from_str(kind)
            .with_context(|| format!("unknown period kind '{}' (tp, tz)", kind))?;
    }
    if let Some(ratio) = args.tp_over_tz {
        sea.tp_over_tz = ratio;
    }
    if let Some(speed) = args.speed {
        sea.speed = speed;
    }
    if let Some(unit) = &args.speed_unit {
        sea.speed_unit = SpeedUnit::from_str(unit)
            .with_context(|| format!("unknown speed unit '{}' (kn, ms)", unit))?;
    }
    if let Some(heading) = args.heading {
        sea.heading_deg = heading;
    }
    if let Some(convention) = &args.convention {
        sea.convention = ConventionChoice::from_str(convention)
            .with_context(|| format!("unknown convention '{}' (auto, abs, enc)", convention))?;
    }
    sea.validate()?;
    Ok(sea)
}

fn cmd_aggregate(args: AggregateArgs) -> Result<()> {
    let config = load_config(&args.config)?.unwrap_or_default();
    let sea = sea_state_from(&args, config.sea_state.clone())?;

    let bytes =
        std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let table = TableParser::new(config.columns.clone()).parse(&String::from_utf8_lossy(&bytes))?;
    info!("Read {} rows from {}", table.len(), args.input.display());

    let nodes = FrequencyNodes::new(table.to_nodes())?;
    let spectrum = IttcSpectrum::from_sea_state(&sea)?;
    let mapping = EncounterMapping::new(sea.speed_ms(), sea.heading_deg);
    let aggregator = SpectralAggregator::new(spectrum, mapping);
    let decision = aggregator.decide(&nodes, sea.convention)?;

    info!(
        "Chosen reading {} (abs error {:.4}, enc error {:.4})",
        decision.chosen.tag(),
        decision.error_absolute,
        decision.error_encounter
    );

    if let Some(details) = &args.details {
        let csv = decision.chosen_scenario().to_csv(&table.amplitude_names);
        std::fs::write(details, csv).with_context(|| format!("writing {}", details.display()))?;
        println!("Node contributions written to {:?}", details);
    }

    match args.output_format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&decision)?),
        _ => println!("{}", decision.to_text(&table.amplitude_names, args.top)),
    }
    Ok(())
}

struct SynthArgs {
    output: PathBuf,
    kind: String,
    frequencies: String,
    model: String,
    noise: f64,
    speed: f64,
    wave_height: f64,
    overflow_every: Option<usize>,
    seed: u64,
}

fn parse_frequencies(list: &str) -> Result<Vec<f64>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid frequency '{}'", s))
        })
        .collect()
}

fn cmd_synth(args: SynthArgs) -> Result<()> {
    let kind = RunKind::from_str(&args.kind)
        .with_context(|| format!("unknown run kind '{}' (resistance, motion)", args.kind))?;
    let model = ResponseModel::from_str(&args.model)
        .with_context(|| format!("unknown response model '{}'", args.model))?;
    let frequencies = parse_frequencies(&args.frequencies)?;
    if frequencies.is_empty() {
        bail!("No frequencies given");
    }

    let ship = ShipModel {
        speed_ms: args.speed,
        wave_height: args.wave_height,
        response_model: model,
        noise_std: args.noise,
        ..Default::default()
    };

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    for (i, &omega) in frequencies.iter().enumerate() {
        let mut run = SyntheticRun::new(kind, omega, ship.clone());
        if let Some(n) = args.overflow_every {
            run = run.with_overflow_every(n);
        }
        let text = run.to_text(args.seed.wrapping_add(i as u64))?;
        let path = args.output.join(run.file_name());
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    println!("Wrote {} {:?} runs to {:?}", frequencies.len(), kind, args.output);
    Ok(())
}

fn cmd_config(preset: &str) -> Result<()> {
    let analysis = AnalysisConfig::preset(preset)
        .with_context(|| format!("unknown preset '{}' (default, resistance, motion)", preset))?;
    let config = ProjectConfig {
        analysis,
        ..Default::default()
    };
    print!("{}", config.to_yaml()?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Resistance {
            dir,
            pattern,
            column,
            config,
            ship_length,
            table,
            output,
            output_format,
            parallel,
        } => cmd_resistance(ResistanceArgs {
            dir,
            pattern,
            column,
            config,
            ship_length,
            table,
            output,
            output_format,
            parallel,
        }),

        Commands::Motion {
            dir,
            pattern,
            heave_column,
            pitch_column,
            wave_height,
            policy,
            config,
            ship_length,
            table,
            output,
            output_format,
            parallel,
        } => cmd_motion(MotionArgs {
            dir,
            pattern,
            heave_column,
            pitch_column,
            wave_height,
            policy,
            config,
            ship_length,
            table,
            output,
            output_format,
            parallel,
        }),

        Commands::Aggregate {
            input,
            config,
            hs,
            period,
            period_kind,
            tp_over_tz,
            speed,
            speed_unit,
            heading,
            convention,
            details,
            top,
            output_format,
        } => cmd_aggregate(AggregateArgs {
            input,
            config,
            hs,
            period,
            period_kind,
            tp_over_tz,
            speed,
            speed_unit,
            heading,
            convention,
            details,
            top,
            output_format,
        }),

        Commands::Synth {
            output,
            kind,
            frequencies,
            model,
            noise,
            speed,
            wave_height,
            overflow_every,
            seed,
        } => cmd_synth(SynthArgs {
            output,
            kind,
            frequencies,
            model,
            noise,
            speed,
            wave_height,
            overflow_every,
            seed,
        }),

        Commands::Config { preset } => cmd_config(&preset),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_pass_validation() {
        assert!(analysis_config(None, AnalysisConfig::resistance, None).is_ok());
        assert!(analysis_config(None, AnalysisConfig::motion, None).is_ok());
    }

    #[test]
    fn test_policy_override_is_validated() {
        let analysis = analysis_config(None, AnalysisConfig::motion, Some("fixed:4")).unwrap();
        assert_eq!(analysis.convergence.tail_policy, TailPolicy::FixedWindow { cycles: 4 });

        assert!(analysis_config(None, AnalysisConfig::motion, Some("fixed:0")).is_err());
        assert!(analysis_config(None, AnalysisConfig::motion, Some("bogus")).is_err());
    }

    #[test]
    fn test_config_file_settings_are_validated() {
        let mut config = ProjectConfig::default();
        config.analysis.convergence.min_converged_cycles = 0;
        assert!(analysis_config(Some(&config), AnalysisConfig::resistance, None).is_err());

        // A valid override does not rescue an invalid scan window
        assert!(analysis_config(Some(&config), AnalysisConfig::motion, Some("scan")).is_err());
    }
}
