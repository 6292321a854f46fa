//! Per-instrument analysis: resolve the source, consult the record cache,
//! otherwise load prices, fit the trend and persist the statistics.

use crate::adapters::api_client::{ApiClient, ApiClientConfig};
use crate::adapters::delimited_adapter::read_delimited;
use crate::adapters::record_cache::RecordCache;
use crate::adapters::remote_adapter::BorsdataSource;
use crate::adapters::spreadsheet_adapter::read_spreadsheet;
use crate::adapters::trend_export::write_trend_export;
use crate::domain::correction::CorrectionTable;
use crate::domain::error::SnrError;
use crate::domain::record::{CacheEntry, CacheKey, CacheOutcome, Validity};
use crate::domain::series::{RawClose, Series, build_series};
use crate::domain::settings::Settings;
use crate::domain::signal::{InstrumentStats, SignalNoise};
use crate::domain::trend::TrendModel;
use crate::ports::http_port::HttpTransport;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xls", "xlsx", "ods"];
const DELIMITED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Where an instrument's prices come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceSource {
    Remote { ticker: String },
    Spreadsheet { path: PathBuf },
    Delimited { path: PathBuf },
}

impl PriceSource {
    /// An existing file is chosen by extension; a non-existing name with a
    /// known file extension is still a file (and will fail as not found);
    /// anything else is a ticker.
    pub fn resolve(identifier: &str) -> Result<Self, SnrError> {
        let path = Path::new(identifier);
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let is_file = path.is_file();
        let path = if is_file {
            fs::canonicalize(path)?
        } else {
            path.to_path_buf()
        };

        match extension.as_deref() {
            Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext) => Ok(Self::Spreadsheet { path }),
            Some(ext) if DELIMITED_EXTENSIONS.contains(&ext) => Ok(Self::Delimited { path }),
            _ if is_file => Err(SnrError::format_mismatch(
                identifier,
                "unsupported file type (expected .xls, .xlsx, .ods, .csv or .txt)",
            )),
            _ => Ok(Self::Remote {
                ticker: identifier.trim().to_uppercase(),
            }),
        }
    }

    /// Normalized identifier used for cache keys.
    pub fn identifier(&self) -> String {
        match self {
            Self::Remote { ticker } => ticker.clone(),
            Self::Spreadsheet { path } | Self::Delimited { path } => path.display().to_string(),
        }
    }

    pub fn cache_key(&self, years: f64) -> CacheKey {
        CacheKey::new(self.identifier(), years)
    }

    /// Name the correction table knows this instrument by: the ticker for
    /// remote sources, the ticker part of the file name otherwise.
    pub fn correction_identifier(&self) -> String {
        match self {
            Self::Remote { ticker } => ticker.clone(),
            Self::Spreadsheet { path } | Self::Delimited { path } => file_ticker_and_name(path).0,
        }
    }

    /// File sources are judged against the file's modification time; remote
    /// sources against `max_age`.
    pub fn validity(&self, max_age: TimeDelta) -> Result<Validity, SnrError> {
        match self {
            Self::Remote { .. } => Ok(Validity::MaxAge(max_age)),
            Self::Spreadsheet { path } | Self::Delimited { path } => {
                let modified = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .map_err(|e| SnrError::not_found(path.display().to_string(), e))?;
                Ok(Validity::NewerThan(DateTime::<Utc>::from(modified)))
            }
        }
    }
}

/// `TICKER-Name-Price.ext` → (`TICKER`, `Name`). A stem without a dash is
/// used for both.
pub fn file_ticker_and_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut parts = stem.split('-');
    let ticker = parts.next().unwrap_or_default().to_string();
    let name = parts.next().map(str::to_string).unwrap_or_else(|| ticker.clone());
    (ticker, name)
}

/// Prices and descriptive fields for one instrument.
#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub ticker: String,
    pub display_name: String,
    pub f_score: Option<i64>,
    pub series: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub stats: InstrumentStats,
    pub outcome: CacheOutcome,
    pub export: Option<PathBuf>,
}

pub struct Analyzer {
    remote: BorsdataSource,
    records: RecordCache,
    corrections: CorrectionTable,
    record_max_age: TimeDelta,
    export_dir: PathBuf,
}

impl Analyzer {
    pub fn new(
        remote: BorsdataSource,
        records: RecordCache,
        corrections: CorrectionTable,
        record_max_age: TimeDelta,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            remote,
            records,
            corrections,
            record_max_age,
            export_dir,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        transport: Box<dyn HttpTransport>,
        corrections: CorrectionTable,
        export_dir: PathBuf,
    ) -> Self {
        let client = ApiClient::new(
            transport,
            ApiClientConfig {
                host: settings.api_host.clone(),
                api_key: settings.api_key.clone(),
                cache_dir: settings.cache_dir.clone(),
                min_interval: settings.min_interval,
                offline: settings.offline,
            },
        );
        Self::new(
            BorsdataSource::new(client),
            RecordCache::new(&settings.cache_dir),
            corrections,
            settings.record_max_age,
            export_dir,
        )
    }

    /// Requests sent to the remote API during this run.
    pub fn live_requests(&self) -> usize {
        self.remote.client().live_requests()
    }

    /// Statistics for `identifier` over the last `years`. With `export` the
    /// record cache is bypassed and the trend file is written.
    pub fn analyze(
        &mut self,
        identifier: &str,
        years: f64,
        export: bool,
    ) -> Result<Analysis, SnrError> {
        let source = PriceSource::resolve(identifier)?;
        let key = source
            .cache_key(years)
            .with_corrections(self.corrections.fingerprint(&source.correction_identifier()));
        let now = Utc::now();

        if !export {
            if let Some(stats) = self.cached(&source, &key, now)? {
                return Ok(Analysis {
                    stats,
                    outcome: CacheOutcome::Fresh,
                    export: None,
                });
            }
        }

        let loaded = self.load(&source, years, Local::now().date_naive())?;
        let model = TrendModel::fit(&loaded.series)?;
        let signal = SignalNoise::compute(&model, &loaded.series);

        let export = if export {
            Some(write_trend_export(
                &self.export_dir,
                &loaded.ticker,
                &loaded.display_name,
                &loaded.series,
                &model,
            )?)
        } else {
            None
        };

        let stats = InstrumentStats {
            ticker: loaded.ticker,
            display_name: loaded.display_name,
            last_updated: loaded.series.latest().date().format("%Y-%m-%d").to_string(),
            f_score: loaded.f_score,
            yearly_growth: signal.yearly_growth,
            rmsd: signal.rmsd,
            price_vs_trend: signal.price_vs_trend,
            full_years_covered: loaded.series.full_years_covered(),
        };

        // Losing the record only costs a recomputation next time.
        if let Err(e) = self.records.store(&CacheEntry::new(&key, now, stats.clone())) {
            warn!(identifier = key.identifier(), error = %e, "could not store record");
        }
        info!(identifier = key.identifier(), "recomputed statistics");

        Ok(Analysis {
            stats,
            outcome: CacheOutcome::Recomputed,
            export,
        })
    }

    fn cached(
        &self,
        source: &PriceSource,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Result<Option<InstrumentStats>, SnrError> {
        let validity = source.validity(self.record_max_age)?;
        let Some(entry) = self.records.load(key) else {
            return Ok(None);
        };
        if validity.accepts(entry.computed_at, now) {
            debug!(
                identifier = key.identifier(),
                computed_at = %entry.computed_at,
                "record is fresh"
            );
            Ok(Some(entry.stats))
        } else {
            debug!(
                identifier = key.identifier(),
                computed_at = %entry.computed_at,
                "record is stale"
            );
            Ok(None)
        }
    }

    pub fn load(
        &mut self,
        source: &PriceSource,
        years: f64,
        today: NaiveDate,
    ) -> Result<LoadedPrices, SnrError> {
        match source {
            PriceSource::Remote { ticker } => {
                let instrument = self.remote.find_instrument(ticker)?;
                let closes = self.remote.stock_prices(instrument.id)?;
                let series =
                    build_series(&instrument.ticker, closes, years, today, &self.corrections)?;
                let f_score = match self.remote.f_score(instrument.id) {
                    Ok(score) => score,
                    Err(e) => {
                        warn!(ticker = %instrument.ticker, error = %e, "F-score unavailable");
                        None
                    }
                };
                Ok(LoadedPrices {
                    ticker: instrument.ticker,
                    display_name: instrument.name,
                    f_score,
                    series,
                })
            }
            PriceSource::Spreadsheet { path } => {
                self.load_file(path, read_spreadsheet(path)?, years, today)
            }
            PriceSource::Delimited { path } => {
                self.load_file(path, read_delimited(path)?, years, today)
            }
        }
    }

    fn load_file(
        &self,
        path: &Path,
        closes: Vec<RawClose>,
        years: f64,
        today: NaiveDate,
    ) -> Result<LoadedPrices, SnrError> {
        let (ticker, display_name) = file_ticker_and_name(path);
        let series = build_series(&ticker, closes, years, today, &self.corrections)?;
        Ok(LoadedPrices {
            ticker,
            display_name,
            f_score: None,
            series,
        })
    }
}
