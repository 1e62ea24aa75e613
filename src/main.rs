use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pulsereport::config::AnalyzerConfig;
use pulsereport::error::Result;
use pulsereport::report::grid;

#[derive(Parser, Debug)]
#[command(
    name = "pulsereport",
    version,
    about = "Detect current pulses and lay out a formula-driven report"
)]
struct Cli {
    /// Input data file (.csv, .xls, .xlsx)
    input: PathBuf,

    /// Output sheet, written as CSV with live formulas
    output: PathBuf,

    /// JSON analyzer configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the full report structure as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Stop segmentation after this many pulses
    #[arg(long)]
    max_pulses: Option<usize>,

    /// Only the first N pulses get summary rows
    #[arg(long)]
    summary_limit: Option<usize>,
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };
    if cli.max_pulses.is_some() {
        config.pulse.max_pulses = cli.max_pulses;
    }
    if cli.summary_limit.is_some() {
        config.layout.summary_limit = cli.summary_limit;
    }

    tracing::info!(
        "Baseline threshold: {}, pulse start: {}, pulse end: {}",
        config.pulse.baseline_threshold,
        config.pulse.pulse_start_threshold,
        config.pulse.pulse_end_threshold
    );

    let report = pulsereport::analyze_file(&cli.input, &config)?;

    // Serialize everything before touching the filesystem so a failure leaves nothing behind.
    let grid = grid::render(&report.layout);
    let json = cli.json.as_ref().map(|_| report.to_json()).transpose()?;

    grid::save_csv(&grid, &cli.output)?;
    if let (Some(path), Some(json)) = (&cli.json, json) {
        std::fs::write(path, json)?;
        tracing::info!("Report structure saved to {:?}", path);
    }

    print!("{}", report.analysis.report());
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if !cli.input.exists() {
        tracing::error!("Input file {:?} does not exist", cli.input);
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => {
            println!("SUCCESS: output saved to {}", cli.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Processing failed: {e}");
            ExitCode::FAILURE
        }
    }
}
