//! Canonical price series.
//!
//! Every source delivers a list of [`RawClose`] records in whatever order it
//! likes. [`build_series`] turns those into a [`Series`]: most-recent-first
//! walk, lookback cutoff, sanity filtering, corrections, log10, ascending.

use crate::domain::correction::CorrectionTable;
use crate::domain::error::SnrError;
use chrono::{Days, NaiveDate};
use tracing::debug;

pub const DAYS_PER_YEAR: f64 = 365.25;
pub const MIN_SERIES_POINTS: usize = 2;

/// Days at or below this are treated as misread rows rather than prices.
pub const MIN_SANE_DAY: i64 = 10_000;

// NaiveDate's default is 1970-01-01.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Days since 1970-01-01.
pub fn day_index(date: NaiveDate) -> i64 {
    (date - epoch()).num_days()
}

pub fn date_from_day(day: i64) -> NaiveDate {
    if day >= 0 {
        epoch() + Days::new(day as u64)
    } else {
        epoch() - Days::new(day.unsigned_abs())
    }
}

/// A close price as delivered by a source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClose {
    pub date: NaiveDate,
    pub close: f64,
}

impl RawClose {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub day: i64,
    pub log_price: f64,
}

impl PricePoint {
    pub fn price(&self) -> f64 {
        10f64.powf(self.log_price)
    }

    pub fn date(&self) -> NaiveDate {
        date_from_day(self.day)
    }
}

/// Ascending-by-day price history with at least [`MIN_SERIES_POINTS`] points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    points: Vec<PricePoint>,
}

impl Series {
    pub fn new(identifier: &str, mut points: Vec<PricePoint>) -> Result<Self, SnrError> {
        if points.len() < MIN_SERIES_POINTS {
            return Err(SnrError::InsufficientData {
                identifier: identifier.to_string(),
                points: points.len(),
                minimum: MIN_SERIES_POINTS,
            });
        }
        if let Some(bad) = points.iter().find(|p| !p.log_price.is_finite()) {
            return Err(SnrError::DegenerateSeries {
                reason: format!("non-finite log price on {}", bad.date()),
            });
        }
        points.sort_by_key(|p| p.day);
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    /// Most recent point.
    pub fn latest(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn full_years_covered(&self) -> f64 {
        (self.latest().day - self.first().day) as f64 / DAYS_PER_YEAR
    }
}

pub fn build_series(
    identifier: &str,
    mut records: Vec<RawClose>,
    years: f64,
    today: NaiveDate,
    corrections: &CorrectionTable,
) -> Result<Series, SnrError> {
    if records.len() >= 2 && records[0].date < records[1].date {
        records.reverse();
    }

    let today_day = day_index(today);
    let mut latest_day: Option<i64> = None;
    let mut points = Vec::with_capacity(records.len());

    for record in &records {
        let day = day_index(record.date);
        if day <= MIN_SANE_DAY || day > today_day || !(record.close > 0.0) {
            debug!(identifier, date = %record.date, close = record.close, "discarding point");
            continue;
        }

        let latest = *latest_day.get_or_insert(day);
        if (day as f64) < latest as f64 - DAYS_PER_YEAR * years {
            break;
        }

        let price = record.close * corrections.factor(identifier, record.date);
        if !(price > 0.0) || !price.is_finite() {
            debug!(identifier, date = %record.date, "discarding corrected point");
            continue;
        }
        points.push(PricePoint {
            day,
            log_price: price.log10(),
        });
    }

    points.reverse();
    Series::new(identifier, points)
}
