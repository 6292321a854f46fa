//! Spreadsheet price export adapter (Börsdata `*-Price.xls[x]` files).
//!
//! Expected layout: row 0 holds `Date` in column 0 and `Closeprice` in
//! column 4; data rows follow. Older exports store the date as text, newer
//! ones as a native date cell.

use crate::domain::error::SnrError;
use crate::domain::series::RawClose;
use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Days, NaiveDate};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

pub const PREFERRED_SHEET: &str = "PriceDay";
pub const DATE_COLUMN: usize = 0;
pub const CLOSE_COLUMN: usize = 4;

pub fn read_spreadsheet(path: &Path) -> Result<Vec<RawClose>, SnrError> {
    let source_name = path.display().to_string();
    // calamine folds I/O failures into per-format errors, so probe the file first.
    File::open(path).map_err(|e| SnrError::not_found(&source_name, e))?;
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        SnrError::format_mismatch(&source_name, format!("unreadable workbook: {e}"))
    })?;

    let range = match workbook.worksheet_range(PREFERRED_SHEET) {
        Ok(range) => range,
        Err(_) => {
            debug!(%source_name, "no {PREFERRED_SHEET} sheet, using the first worksheet");
            workbook
                .worksheet_range_at(0)
                .ok_or_else(|| {
                    SnrError::format_mismatch(&source_name, "workbook has no worksheets")
                })?
                .map_err(|e| SnrError::format_mismatch(&source_name, e.to_string()))?
        }
    };

    parse_rows(&source_name, range.rows())
}

pub fn parse_rows<'a>(
    source_name: &str,
    mut rows: impl Iterator<Item = &'a [Data]>,
) -> Result<Vec<RawClose>, SnrError> {
    let header = rows
        .next()
        .ok_or_else(|| SnrError::format_mismatch(source_name, "empty worksheet"))?;
    let date_label = header.get(DATE_COLUMN).map(cell_text);
    let close_label = header.get(CLOSE_COLUMN).map(cell_text);
    if date_label.as_deref() != Some("Date") || close_label.as_deref() != Some("Closeprice") {
        return Err(SnrError::format_mismatch(
            source_name,
            format!("expected Date/Closeprice header, found {date_label:?}/{close_label:?}"),
        ));
    }

    let mut closes = Vec::new();
    for (index, row) in rows.enumerate() {
        let Some(date) = row.get(DATE_COLUMN).and_then(cell_date) else {
            debug!(source_name, row = index + 1, "skipping row without a date");
            continue;
        };
        let close = row.get(CLOSE_COLUMN).and_then(cell_number).unwrap_or_else(|| {
            warn!(source_name, %date, "close price is not a number");
            0.0
        });
        closes.push(RawClose::new(date, close));
    }
    Ok(closes)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        Data::Float(serial) => excel_serial_to_date(*serial),
        Data::Int(serial) => excel_serial_to_date(*serial as f64),
        Data::String(s) | Data::DateTimeIso(s) => {
            let s = s.trim();
            NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Excel day serials count from 1899-12-30 (the 1900 leap-year bug included).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn header() -> Vec<Data> {
        vec![s("Date"), s("Open"), s("High"), s("Low"), s("Closeprice"), s("Volume")]
    }

    fn row(date_cell: Data, close: Data) -> Vec<Data> {
        vec![date_cell, Data::Empty, Data::Empty, Data::Empty, close, Data::Int(1000)]
    }

    #[test]
    fn accepts_text_and_serial_dates() {
        let rows = vec![
            header(),
            row(s("2024-01-17"), Data::Float(115.5)),
            // 45307 is 2024-01-16 in the 1900 date system.
            row(Data::Float(45307.0), Data::Float(110.0)),
            row(s("2024-01-15 00:00:00"), s("105,25")),
        ];
        let closes = parse_rows("x.xls", rows.iter().map(Vec::as_slice)).unwrap();
        assert_eq!(
            closes,
            vec![
                RawClose::new(date(2024, 1, 17), 115.5),
                RawClose::new(date(2024, 1, 16), 110.0),
                RawClose::new(date(2024, 1, 15), 105.25),
            ]
        );
    }

    #[test]
    fn rejects_unexpected_header() {
        let rows = vec![
            vec![s("Date"), s("Open"), s("High"), s("Low"), s("Close")],
            row(s("2024-01-17"), Data::Float(1.0)),
        ];
        let err = parse_rows("x.xls", rows.iter().map(Vec::as_slice)).unwrap_err();
        assert!(matches!(err, SnrError::FormatMismatch { .. }));
    }

    #[test]
    fn rejects_short_header_row() {
        let rows = vec![vec![s("Date")]];
        let err = parse_rows("x.xls", rows.iter().map(Vec::as_slice)).unwrap_err();
        assert!(matches!(err, SnrError::FormatMismatch { .. }));
    }

    #[test]
    fn rejects_empty_sheet() {
        let rows: Vec<Vec<Data>> = Vec::new();
        let err = parse_rows("x.xls", rows.iter().map(Vec::as_slice)).unwrap_err();
        assert!(matches!(err, SnrError::FormatMismatch { .. }));
    }

    #[test]
    fn skips_rows_without_dates_and_zeroes_bad_prices() {
        let rows = vec![
            header(),
            row(s("2024-01-17"), s("n/a")),
            row(s("Source: Börsdata"), Data::Empty),
            vec![],
        ];
        let closes = parse_rows("x.xls", rows.iter().map(Vec::as_slice)).unwrap();
        assert_eq!(closes, vec![RawClose::new(date(2024, 1, 17), 0.0)]);
    }

    #[test]
    fn serial_conversion() {
        assert_eq!(excel_serial_to_date(1.0), Some(date(1899, 12, 31)));
        assert_eq!(excel_serial_to_date(45292.75), Some(date(2024, 1, 1)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_spreadsheet(&dir.path().join("ABC-Abc-Price.xlsx")).unwrap_err();
        assert!(matches!(err, SnrError::NotFound { .. }));
    }
}
