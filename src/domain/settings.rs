//! Validated runtime settings.
//!
//! Reads every config value once, checks it, and hands the rest of the
//! program plain typed fields.

use crate::domain::error::SnrError;
use crate::domain::ranking::{DEFAULT_MIN_GROWTH, DEFAULT_MIN_SNR, ScreenThresholds};
use crate::ports::config_port::ConfigPort;
use chrono::TimeDelta;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_HOST: &str = "apiservice.borsdata.se";
pub const PLACEHOLDER_API_KEY: &str = "xxx";
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 550;
pub const DEFAULT_RECORD_MAX_AGE_HOURS: u64 = 24;
pub const DEFAULT_YEARS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub api_host: String,
    pub min_interval: Duration,
    pub offline: bool,
    pub cache_dir: PathBuf,
    pub record_max_age: TimeDelta,
    pub corrections_file: Option<PathBuf>,
    pub years: f64,
    pub thresholds: ScreenThresholds,
}

impl Settings {
    /// `root` is the configuration directory; `home` expands `~/` in paths.
    pub fn from_config(
        config: &dyn ConfigPort,
        root: &Path,
        home: &Path,
    ) -> Result<Self, SnrError> {
        let years = config.get_f64("screen", "years", DEFAULT_YEARS);
        validate_positive(years, "screen", "years")?;

        let min_growth = config.get_f64("screen", "min_growth", DEFAULT_MIN_GROWTH);
        validate_threshold(min_growth, "min_growth")?;
        let min_snr = config.get_f64("screen", "min_snr", DEFAULT_MIN_SNR);
        validate_threshold(min_snr, "min_snr")?;

        let max_age_hours =
            config.get_u64("cache", "record_max_age_hours", DEFAULT_RECORD_MAX_AGE_HOURS);
        if max_age_hours == 0 {
            return Err(invalid(
                "cache",
                "record_max_age_hours",
                "record_max_age_hours must be positive",
            ));
        }

        let api_host = config
            .get_string("api", "host")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string());
        if api_host.contains('/') {
            return Err(invalid("api", "host", "host must not contain a path or scheme"));
        }

        Ok(Self {
            api_key: config
                .get_string("api", "api_key")
                .map(|k| k.trim().to_string())
                .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string()),
            api_host,
            min_interval: Duration::from_millis(config.get_u64(
                "api",
                "min_interval_ms",
                DEFAULT_MIN_INTERVAL_MS,
            )),
            offline: config.get_bool("api", "offline", false),
            cache_dir: config
                .get_path("cache", "directory", home)
                .unwrap_or_else(|| root.join("cache")),
            record_max_age: TimeDelta::hours(max_age_hours as i64),
            corrections_file: config.get_path("corrections", "file", home),
            years,
            thresholds: ScreenThresholds {
                min_growth,
                min_snr,
            },
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != PLACEHOLDER_API_KEY
    }
}

pub fn validate_years(years: f64) -> Result<(), SnrError> {
    validate_positive(years, "screen", "years")
}

/// Screening thresholds may be any finite number, including negative ones.
pub fn validate_threshold(value: f64, key: &str) -> Result<(), SnrError> {
    if !value.is_finite() {
        return Err(invalid("screen", key, &format!("{key} must be a number")));
    }
    Ok(())
}

fn validate_positive(value: f64, section: &str, key: &str) -> Result<(), SnrError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> SnrError {
    SnrError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
