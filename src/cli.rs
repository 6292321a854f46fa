//! CLI definition and dispatch.

use clap::{ArgAction, Parser};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::correction_adapter::load_corrections;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http_transport::{DEFAULT_TIMEOUT, ReqwestTransport};
use crate::analysis::Analyzer;
use crate::domain::correction::CorrectionTable;
use crate::domain::error::SnrError;
use crate::domain::ranking::{RankedInstrument, average_yearly_growth, rank};
use crate::domain::settings::{Settings, validate_threshold, validate_years};
use crate::domain::signal::InstrumentStats;
use crate::logging::init_logging;

const CONFIG_DIR: &str = ".snrscan";
const CONFIG_FILE: &str = "config.ini";
const NAME_WIDTH: usize = 20;

#[derive(Parser, Debug)]
#[command(
    name = "snrscan",
    version,
    about = "Rank instruments by the signal-to-noise ratio of their price trend"
)]
pub struct Cli {
    /// Tickers or price export files (.xls, .xlsx, .ods, .csv, .txt)
    #[arg(required = true)]
    pub identifiers: Vec<String>,
    /// Lookback window in years
    #[arg(long)]
    pub years: Option<f64>,
    /// Minimum yearly growth for a qualifying instrument
    #[arg(long)]
    pub min_growth: Option<f64>,
    /// Minimum signal-to-noise ratio for a qualifying instrument
    #[arg(long)]
    pub min_snr: Option<f64>,
    /// Write a price-with-trend file per instrument
    #[arg(long)]
    pub export: bool,
    /// Serve remote data from the response cache only
    #[arg(long)]
    pub offline: bool,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory for exported files (default: current directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// More diagnostics on stderr (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    // Stage 1: Load config
    let home = home_dir();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&home));
    let adapter = match load_config(&config_path, cli.config.is_none()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Settings with command-line overrides
    let root = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let settings = match Settings::from_config(&adapter, &root, &home)
        .and_then(|s| apply_overrides(s, &cli))
    {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if !settings.has_api_key() && !settings.offline {
        warn!(config = %config_path.display(), "no API key configured; remote tickers will fail");
    }

    // Stage 3: Corrections and analyzer
    let corrections = match &settings.corrections_file {
        Some(path) => match load_corrections(path) {
            Ok(table) => {
                info!(entries = table.len(), path = %path.display(), "loaded price corrections");
                table
            }
            Err(e) => return fail(&e),
        },
        None => CorrectionTable::default(),
    };
    let transport = match ReqwestTransport::new(DEFAULT_TIMEOUT) {
        Ok(t) => t,
        Err(e) => {
            return fail(&SnrError::TransportFailure {
                path: settings.api_host.clone(),
                reason: e.to_string(),
            });
        }
    };
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut analyzer =
        Analyzer::from_settings(&settings, Box::new(transport), corrections, output_dir);

    // Stage 4: Analyze and rank
    let stats = match run_batch(&mut analyzer, &cli.identifiers, settings.years, cli.export) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let ranked = match rank(stats, &settings.thresholds) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    // Stage 5: Report
    print!("{}", format_report(&ranked, settings.years));
    ExitCode::SUCCESS
}

fn fail(err: &SnrError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// An explicitly given config must exist; the default one is created on
/// first use.
pub fn load_config(path: &Path, create_if_missing: bool) -> Result<FileConfigAdapter, ExitCode> {
    let result = if create_if_missing {
        FileConfigAdapter::load_or_create(path).map(|(adapter, created)| {
            if created {
                eprintln!(
                    "Created {} with a placeholder API key; edit it to use remote tickers.",
                    path.display()
                );
            }
            adapter
        })
    } else {
        FileConfigAdapter::from_file(path)
    };
    result.map_err(|e| {
        let err = SnrError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn apply_overrides(mut settings: Settings, cli: &Cli) -> Result<Settings, SnrError> {
    if let Some(years) = cli.years {
        validate_years(years)?;
        settings.years = years;
    }
    if let Some(min_growth) = cli.min_growth {
        validate_threshold(min_growth, "min_growth")?;
        settings.thresholds.min_growth = min_growth;
    }
    if let Some(min_snr) = cli.min_snr {
        validate_threshold(min_snr, "min_snr")?;
        settings.thresholds.min_snr = min_snr;
    }
    if cli.offline {
        settings.offline = true;
    }
    Ok(settings)
}

/// Analyzes each identifier in order. Unknown instruments are reported and
/// skipped; any other failure ends the batch.
pub fn run_batch(
    analyzer: &mut Analyzer,
    identifiers: &[String],
    years: f64,
    export: bool,
) -> Result<Vec<InstrumentStats>, SnrError> {
    let mut stats = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        match analyzer.analyze(identifier, years, export) {
            Ok(analysis) => {
                if let Some(path) = &analysis.export {
                    eprintln!("Trend written to: {}", path.display());
                }
                stats.push(analysis.stats);
            }
            Err(e) if e.is_skippable() => {
                info!(%identifier, reason = %e, "skipping instrument");
                eprintln!("{identifier}: not found, ignoring this instrument");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(stats)
}

pub fn format_report(ranked: &[RankedInstrument], years: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<10} {:<20} {:>3} yrs ø    RMSD    SNR     Now   FS     Updated",
        "Ticker", "Name", years
    );
    for r in ranked {
        let s = &r.stats;
        let name: String = s.display_name.chars().take(NAME_WIDTH).collect();
        let f_score = s
            .displayed_f_score()
            .map(|f| f.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {:<10} {:<20} {:>+11.1}% {:>6.1}% {:>6.2} {:>+6.1}% {:>4}{:>12}",
            r.classification.marker(),
            s.ticker,
            name,
            100.0 * s.yearly_growth,
            100.0 * s.rmsd,
            r.snr,
            100.0 * s.price_vs_trend,
            f_score,
            s.last_updated,
        );
    }
    if let Some(avg) = average_yearly_growth(ranked) {
        let _ = writeln!(out, "  {:<31} {:>+11.1}%", "Average:", 100.0 * avg);
    }
    out
}
