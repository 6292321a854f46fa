//! Ranking of instruments by signal-to-noise ratio.

use crate::domain::error::SnrError;
use crate::domain::signal::InstrumentStats;

pub const DEFAULT_MIN_GROWTH: f64 = 0.2;
pub const DEFAULT_MIN_SNR: f64 = 1.5;

/// At or below this SNR growth is not distinguishable from noise.
pub const WEAK_SNR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenThresholds {
    pub min_growth: f64,
    pub min_snr: f64,
}

impl Default for ScreenThresholds {
    fn default() -> Self {
        Self {
            min_growth: DEFAULT_MIN_GROWTH,
            min_snr: DEFAULT_MIN_SNR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Enough growth, steady, and not overextended relative to its own trend.
    Qualifying,
    Neutral,
    Weak,
}

impl Classification {
    pub fn of(stats: &InstrumentStats, snr: f64, thresholds: &ScreenThresholds) -> Self {
        if stats.yearly_growth >= thresholds.min_growth
            && snr > thresholds.min_snr
            && stats.price_vs_trend.abs() <= stats.rmsd
        {
            Self::Qualifying
        } else if snr <= WEAK_SNR {
            Self::Weak
        } else {
            Self::Neutral
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Self::Qualifying => "+",
            Self::Neutral => " ",
            Self::Weak => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedInstrument {
    pub stats: InstrumentStats,
    pub snr: f64,
    pub classification: Classification,
}

/// Sorts by descending SNR.
pub fn rank(
    stats: Vec<InstrumentStats>,
    thresholds: &ScreenThresholds,
) -> Result<Vec<RankedInstrument>, SnrError> {
    let mut ranked = stats
        .into_iter()
        .map(|stats| {
            let snr = stats.snr()?;
            let classification = Classification::of(&stats, snr, thresholds);
            Ok(RankedInstrument {
                stats,
                snr,
                classification,
            })
        })
        .collect::<Result<Vec<_>, SnrError>>()?;

    ranked.sort_by(|a, b| b.snr.total_cmp(&a.snr));
    Ok(ranked)
}

pub fn average_yearly_growth(ranked: &[RankedInstrument]) -> Option<f64> {
    if ranked.is_empty() {
        return None;
    }
    let total: f64 = ranked.iter().map(|r| r.stats.yearly_growth).sum();
    Some(total / ranked.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(ticker: &str, growth: f64, rmsd: f64, vs_trend: f64) -> InstrumentStats {
        InstrumentStats {
            ticker: ticker.into(),
            display_name: format!("{ticker} AB"),
            last_updated: "2024-06-28".into(),
            f_score: None,
            yearly_growth: growth,
            rmsd,
            price_vs_trend: vs_trend,
            full_years_covered: 10.0,
        }
    }

    #[test]
    fn sorts_by_descending_snr() {
        let ranked = rank(
            vec![
                stats("LOW", 0.05, 0.10, 0.0),
                stats("HIGH", 0.30, 0.10, 0.0),
                stats("MID", 0.15, 0.10, 0.0),
            ],
            &ScreenThresholds::default(),
        )
        .unwrap();
        let tickers: Vec<&str> = ranked.iter().map(|r| r.stats.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["HIGH", "MID", "LOW"]);
        assert_relative_eq!(ranked[0].snr, 3.0);
    }

    #[test]
    fn classification_rules() {
        let t = ScreenThresholds::default();
        let q = stats("Q", 0.25, 0.10, 0.05);
        assert_eq!(Classification::of(&q, 2.5, &t), Classification::Qualifying);

        // Overextended: further above trend than its own noise.
        let over = stats("O", 0.25, 0.10, 0.15);
        assert_eq!(Classification::of(&over, 2.5, &t), Classification::Neutral);

        let slow = stats("S", 0.10, 0.10, 0.0);
        assert_eq!(Classification::of(&slow, 1.0, &t), Classification::Weak);
        assert_eq!(Classification::of(&slow, 1.2, &t), Classification::Neutral);
    }

    #[test]
    fn zero_rmsd_fails_ranking() {
        let err = rank(vec![stats("Z", 0.1, 0.0, 0.0)], &ScreenThresholds::default());
        assert!(matches!(err, Err(SnrError::DivisionUndefined)));
    }

    #[test]
    fn average_growth() {
        let ranked = rank(
            vec![stats("A", 0.1, 0.1, 0.0), stats("B", 0.3, 0.1, 0.0)],
            &ScreenThresholds::default(),
        )
        .unwrap();
        assert_relative_eq!(average_yearly_growth(&ranked).unwrap(), 0.2);
        assert_eq!(average_yearly_growth(&[]), None);
    }
}
