//! Delimited price export adapter.
//!
//! Two dialects are recognised from the first line:
//! - Börsdata semicolon export with a fixed two-row header, quoted fields and
//!   comma decimals.
//! - Yahoo Finance comma CSV with a single header row.

use crate::domain::error::SnrError;
use crate::domain::series::RawClose;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const GROUP_HEADER: [&str; 2] = ["Date", "Price"];
pub const SUB_HEADER: [&str; 2] = ["", "Close"];
pub const YAHOO_HEADER: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];

const YAHOO_CLOSE_COLUMN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Semicolon,
    Yahoo,
}

impl Dialect {
    fn detect(content: &str) -> Self {
        let first = content.lines().next().unwrap_or_default();
        if first.trim_start_matches('\u{feff}').starts_with("Date,") {
            Self::Yahoo
        } else {
            Self::Semicolon
        }
    }
}

/// Reads close prices from a delimited export, in file order.
pub fn read_delimited(path: &Path) -> Result<Vec<RawClose>, SnrError> {
    let bytes = fs::read(path).map_err(|e| SnrError::not_found(path.display().to_string(), e))?;
    // Exports are Latin-1 as often as UTF-8; only ASCII matters for parsing.
    let content = String::from_utf8_lossy(&bytes);
    parse_delimited(&path.display().to_string(), &content)
}

pub fn parse_delimited(source_name: &str, content: &str) -> Result<Vec<RawClose>, SnrError> {
    match Dialect::detect(content) {
        Dialect::Semicolon => parse_semicolon(source_name, content),
        Dialect::Yahoo => parse_yahoo(source_name, content),
    }
}

fn parse_semicolon(source_name: &str, content: &str) -> Result<Vec<RawClose>, SnrError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = rdr.records();

    for (line, expected) in [("first", GROUP_HEADER), ("second", SUB_HEADER)] {
        let header = records
            .next()
            .transpose()
            .map_err(|e| SnrError::format_mismatch(source_name, format!("CSV parse error: {e}")))?
            .ok_or_else(|| {
                SnrError::format_mismatch(source_name, format!("missing {line} header line"))
            })?;
        let fields: Vec<&str> = header.iter().map(clean_field).collect();
        if fields != expected {
            return Err(SnrError::format_mismatch(
                source_name,
                format!("wrong {line} header line: {fields:?}"),
            ));
        }
    }

    let mut closes = Vec::new();
    for result in records {
        let record = result
            .map_err(|e| SnrError::format_mismatch(source_name, format!("CSV parse error: {e}")))?;
        let Some(date) = record.get(0).and_then(parse_date) else {
            debug!(source_name, row = ?record, "skipping row without a date");
            continue;
        };
        // Unparseable prices count as zero and are discarded downstream.
        let close = record.get(1).map(parse_decimal).unwrap_or(0.0);
        closes.push(RawClose::new(date, close));
    }
    Ok(closes)
}

fn parse_yahoo(source_name: &str, content: &str) -> Result<Vec<RawClose>, SnrError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.trim_start_matches('\u{feff}').as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| SnrError::format_mismatch(source_name, format!("CSV parse error: {e}")))?;
    let fields: Vec<&str> = headers.iter().map(str::trim).collect();
    if fields != YAHOO_HEADER {
        return Err(SnrError::format_mismatch(
            source_name,
            format!("wrong Yahoo header line: {fields:?}"),
        ));
    }

    let mut closes = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| SnrError::format_mismatch(source_name, format!("CSV parse error: {e}")))?;
        let Some(date) = record.get(0).and_then(parse_date) else {
            debug!(source_name, row = ?record, "skipping row without a date");
            continue;
        };
        let close = record
            .get(YAHOO_CLOSE_COLUMN)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        closes.push(RawClose::new(date, close));
    }
    Ok(closes)
}

fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

pub(crate) fn parse_date(field: &str) -> Option<NaiveDate> {
    let field = clean_field(field);
    let day = field.get(..10).unwrap_or(field);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// `"1 234,56"` → 1234.56
pub(crate) fn parse_decimal(field: &str) -> f64 {
    let normalized: String = clean_field(field)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    normalized.parse().unwrap_or(0.0)
}
