//! Signal and noise measures derived from a fitted trend.

use crate::domain::error::SnrError;
use crate::domain::series::Series;
use crate::domain::trend::TrendModel;
use serde::{Deserialize, Serialize};

/// Substituted for rmsd when the raw value is non-finite or below it
/// (a perfect fit, e.g. a flat series).
pub const RMSD_FLOOR: f64 = 1e-6;

/// Growth is read off the trend line over this many days.
pub const GROWTH_HORIZON_DAYS: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalNoise {
    pub yearly_growth: f64,
    pub rmsd: f64,
    pub price_vs_trend: f64,
}

impl SignalNoise {
    pub fn compute(model: &TrendModel, series: &Series) -> Self {
        // 10^a / 10^b evaluated as 10^(a - b); the intercept alone can overflow.
        let yearly_growth =
            10f64.powf(model.predict(GROWTH_HORIZON_DAYS) - model.predict(0.0)) - 1.0;

        let points = series.points();
        let mean_square = points
            .iter()
            .map(|p| {
                let residual = p.log_price - model.predict(p.day as f64);
                residual * residual
            })
            .sum::<f64>()
            / points.len() as f64;
        let rmsd = 10f64.powf(mean_square.sqrt()) - 1.0;

        let latest = series.latest();
        let price_vs_trend = 10f64.powf(latest.log_price - model.predict(latest.day as f64)) - 1.0;

        Self {
            yearly_growth: finite_or(yearly_growth, 0.0),
            rmsd: if rmsd.is_finite() && rmsd >= RMSD_FLOOR {
                rmsd
            } else {
                RMSD_FLOOR
            },
            price_vs_trend: finite_or(price_vs_trend, 0.0),
        }
    }

    pub fn snr(&self) -> Result<f64, SnrError> {
        snr(self.yearly_growth, self.rmsd)
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

pub fn snr(yearly_growth: f64, rmsd: f64) -> Result<f64, SnrError> {
    if rmsd == 0.0 {
        return Err(SnrError::DivisionUndefined);
    }
    Ok(yearly_growth / rmsd)
}

/// Summary statistics for one instrument over one lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentStats {
    pub ticker: String,
    pub display_name: String,
    pub last_updated: String,
    pub f_score: Option<i64>,
    pub yearly_growth: f64,
    pub rmsd: f64,
    pub price_vs_trend: f64,
    pub full_years_covered: f64,
}

impl InstrumentStats {
    pub fn snr(&self) -> Result<f64, SnrError> {
        snr(self.yearly_growth, self.rmsd)
    }

    /// The upstream reports 0 both for a real zero and for "not applicable",
    /// so only positive scores are shown.
    pub fn displayed_f_score(&self) -> Option<i64> {
        self.f_score.filter(|&f| f > 0)
    }
}
