//! # rusty-peaks
//!
//! Detect peaks in chromatogram traces and compare samples with a reference.
//!
//! ## Usage
//!
//! ```bash
//! # Peak table of one trace, saved as the reference
//! rusty-peaks analyze reference.json --save-reference reference.table.json
//!
//! # Compare samples with a saved reference
//! rusty-peaks compare --reference-table reference.table.json sample_*.parquet
//!
//! # Compare samples with a reference trace, exporting the summaries
//! rusty-peaks compare --reference reference.json --csv-dir out/ sample_*.parquet
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::info;

use rusty_peaks::config::AnalysisConfig;
use rusty_peaks::data::store::{load_reference, save_reference};
use rusty_peaks::pipeline::analyze_file;
use rusty_peaks::report;
use rusty_peaks::state::SessionState;

/// rusty-peaks - chromatogram peak comparison
#[derive(Parser)]
#[command(name = "rusty-peaks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the configuration file.
#[derive(Args)]
struct AnalysisArgs {
    /// Intensity channel to analyze
    #[arg(long)]
    channel: Option<String>,

    /// Minimum peak height (default: 10% of the trace maximum)
    #[arg(long)]
    min_height: Option<f64>,

    /// Relative height for width measurement, in (0, 1]
    #[arg(long)]
    relative_height: Option<f64>,

    /// Maximum number of samples read per trace
    #[arg(long)]
    max_samples: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect peaks in one trace and print its metrics table
    Analyze {
        /// Trace file (.json, .csv or .parquet)
        #[arg(value_name = "TRACE")]
        input: PathBuf,

        /// Save the metrics table as a reference
        #[arg(long, value_name = "FILE")]
        save_reference: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Compare sample traces with a reference
    Compare {
        /// Reference trace file
        #[arg(long, value_name = "TRACE", conflicts_with = "reference_table")]
        reference: Option<PathBuf>,

        /// Reference table saved by `analyze --save-reference`
        #[arg(long, value_name = "FILE")]
        reference_table: Option<PathBuf>,

        /// Sample trace files
        #[arg(value_name = "SAMPLES", required = true)]
        samples: Vec<PathBuf>,

        /// Position tolerance in seconds (default: 3)
        #[arg(long)]
        position_tolerance: Option<f64>,

        /// FWHM tolerance in seconds (default: 10% of the largest reference width)
        #[arg(long)]
        fwhm_tolerance: Option<f64>,

        /// Height tolerance (default: 10% of the largest reference height)
        #[arg(long)]
        height_tolerance: Option<f64>,

        /// Write Positions/FWHMs/Heights summaries as CSV into this directory
        #[arg(long, value_name = "DIR")]
        csv_dir: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Analyze {
            input,
            save_reference: output,
            analysis,
        } => {
            apply_overrides(&mut config, &analysis)?;
            run_analyze(&input, output.as_deref(), &config)
        }
        Commands::Compare {
            reference,
            reference_table,
            samples,
            position_tolerance,
            fwhm_tolerance,
            height_tolerance,
            csv_dir,
            analysis,
        } => {
            apply_overrides(&mut config, &analysis)?;
            if position_tolerance.is_some() {
                config.tolerances.position = position_tolerance;
            }
            if fwhm_tolerance.is_some() {
                config.tolerances.fwhm = fwhm_tolerance;
            }
            if height_tolerance.is_some() {
                config.tolerances.height = height_tolerance;
            }
            config.validate()?;

            let mut state = SessionState::new(config);
            match (reference, reference_table) {
                (Some(path), _) => state.set_reference_from_file(&path)?,
                (None, Some(path)) => {
                    let table = load_reference(&path)?;
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    state.set_reference(name, table);
                }
                (None, None) => bail!("either --reference or --reference-table is required"),
            }
            run_compare(&mut state, &samples, csv_dir.as_deref())
        }
    }
}

fn apply_overrides(config: &mut AnalysisConfig, args: &AnalysisArgs) -> Result<()> {
    if let Some(channel) = &args.channel {
        config.channel = channel.clone();
    }
    if args.min_height.is_some() {
        config.min_height = args.min_height;
    }
    if let Some(h) = args.relative_height {
        config.relative_height = h;
    }
    if let Some(n) = args.max_samples {
        config.max_samples = n;
    }
    config.validate()?;
    Ok(())
}

fn run_analyze(input: &Path, output: Option<&Path>, config: &AnalysisConfig) -> Result<()> {
    let trace = analyze_file(input, config)?;

    println!("{}", trace.name);
    for (key, value) in &trace.info {
        println!("  {key}: {value}");
    }
    for peak in &trace.analysis.peaks {
        info!(
            "peak at {} (height {:.3}, width {:.2} samples at {:.3}, bounds {:.2}..{:.2})",
            peak.index, peak.height, peak.width, peak.width_height, peak.left_ip, peak.right_ip
        );
    }
    println!("{}", report::render_metrics(&trace.analysis.table, config)?);

    if let Some(path) = output {
        save_reference(path, &trace.analysis.table)?;
        println!("Reference saved to {}", path.display());
    }
    Ok(())
}

fn run_compare(state: &mut SessionState, samples: &[PathBuf], csv_dir: Option<&Path>) -> Result<()> {
    let Some(reference) = state.reference.clone() else {
        bail!("no reference loaded");
    };
    println!(
        "Reference {} ({} peaks)",
        reference.name,
        reference.table.peak_count()
    );
    println!("{}", report::render_metrics(&reference.table, &state.config)?);

    state.add_samples(samples);

    for outcome in &state.outcomes {
        println!();
        match &outcome.result {
            Ok(sample) => {
                println!("{}", outcome.path.display());
                let info = report::render_info(sample);
                if !info.is_empty() {
                    println!("{info}");
                }
                println!("{}", report::render_comparison(sample, &state.config)?);
            }
            Err(_) => {
                if let Some(line) = report::render_failure(outcome) {
                    println!("{line}");
                }
            }
        }
    }

    let summaries = state.summaries();
    for summary in &summaries {
        println!();
        println!("{}", report::render_summary(summary, &state.config)?);
    }

    if let Some(dir) = csv_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
        for summary in &summaries {
            let path = dir.join(format!("{}.csv", summary.metric.plural().to_lowercase()));
            let file = std::fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            report::write_summary_csv(summary, &state.config, file)?;
            info!("wrote {}", path.display());
        }
    }

    if let Some(message) = &state.status_message {
        eprintln!("{message}");
    }
    Ok(())
}
