//! Externally supplied price corrections (split factors and similar
//! corporate actions).
//!
//! The table is data, not code: each row names an identifier, an inclusive
//! date range and a multiplier applied to close prices inside that range.
//! Only listed corrections are applied; nothing is inferred.

use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceCorrection {
    pub identifier: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub multiplier: f64,
}

impl PriceCorrection {
    fn applies_to(&self, identifier: &str, date: NaiveDate) -> bool {
        self.identifier.eq_ignore_ascii_case(identifier) && date >= self.start && date <= self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorrectionTable {
    entries: Vec<PriceCorrection>,
}

impl CorrectionTable {
    pub fn new(entries: Vec<PriceCorrection>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Product of all multipliers covering `date` for `identifier`; 1.0 when none do.
    pub fn factor(&self, identifier: &str, date: NaiveDate) -> f64 {
        self.entries
            .iter()
            .filter(|c| c.applies_to(identifier, date))
            .map(|c| c.multiplier)
            .product()
    }

    /// Text form of every row for `identifier`, in table order; empty when
    /// none apply. Statistics computed under different fingerprints differ.
    pub fn fingerprint(&self, identifier: &str) -> String {
        self.entries
            .iter()
            .filter(|c| c.identifier.eq_ignore_ascii_case(identifier))
            .map(|c| format!("{}..{}x{}", c.start, c.end, c.multiplier))
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn split_table() -> CorrectionTable {
        CorrectionTable::new(vec![PriceCorrection {
            identifier: "INVE-B".into(),
            start: date(2000, 1, 1),
            end: date(2015, 5, 12),
            multiplier: 0.25,
        }])
    }

    #[test]
    fn factor_inside_range() {
        let table = split_table();
        assert_eq!(table.factor("INVE-B", date(2010, 6, 1)), 0.25);
        assert_eq!(table.factor("inve-b", date(2015, 5, 12)), 0.25);
    }

    #[test]
    fn factor_outside_range_or_other_identifier() {
        let table = split_table();
        assert_eq!(table.factor("INVE-B", date(2015, 5, 13)), 1.0);
        assert_eq!(table.factor("ERIC-B", date(2010, 6, 1)), 1.0);
    }

    #[test]
    fn overlapping_corrections_multiply() {
        let mut entries = split_table().entries;
        entries.push(PriceCorrection {
            identifier: "INVE-B".into(),
            start: date(2005, 1, 1),
            end: date(2006, 1, 1),
            multiplier: 0.5,
        });
        let table = CorrectionTable::new(entries);
        assert_eq!(table.factor("INVE-B", date(2005, 6, 1)), 0.125);
    }

    #[test]
    fn empty_table_is_identity() {
        let table = CorrectionTable::default();
        assert!(table.is_empty());
        assert_eq!(table.factor("ANY", date(2020, 1, 1)), 1.0);
    }

    #[test]
    fn fingerprint_covers_only_the_identifier() {
        let table = split_table();
        assert_eq!(table.fingerprint("OTHER"), "");
        assert_eq!(CorrectionTable::default().fingerprint("ABC"), "");

        assert_eq!(table.fingerprint("INVE-B"), "2000-01-01..2015-05-12x0.25");
        assert_eq!(table.fingerprint("inve-b"), table.fingerprint("INVE-B"));
    }
}
