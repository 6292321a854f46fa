//! Log-linear trend model.
//!
//! Ordinary least squares of log10(price) on day index, one explanatory
//! variable, no regularization:
//!
//! slope = Σ(x - x̄)(y - ȳ) / Σ(x - x̄)², intercept = ȳ - slope·x̄
//!
//! Sums are taken over mean-centred values in series order, so refitting the
//! same series is bit-identical.

use crate::domain::error::SnrError;
use crate::domain::series::Series;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendModel {
    slope: f64,
    intercept: f64,
}

impl TrendModel {
    pub fn fit(series: &Series) -> Result<Self, SnrError> {
        let points = series.points();
        if points.len() < 2 {
            return Err(SnrError::DegenerateSeries {
                reason: format!("{} points cannot define a line", points.len()),
            });
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.day as f64).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.log_price).sum::<f64>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for p in points {
            let dx = p.day as f64 - mean_x;
            sxx += dx * dx;
            sxy += dx * (p.log_price - mean_y);
        }

        if sxx == 0.0 || !sxx.is_finite() {
            return Err(SnrError::DegenerateSeries {
                reason: "all points share the same day".into(),
            });
        }

        let slope = sxy / sxx;
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// Predicted log10 price at `day`.
    pub fn predict(&self, day: f64) -> f64 {
        self.intercept + self.slope * day
    }

    /// Log10 price change per day.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}
