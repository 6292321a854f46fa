//! Tab-separated "price with trend" export.
//!
//! ```text
//! "ERIC-Ericsson-Price-with_trend.tsv"
//! "Date"	"Close price"	"Predicted price"
//! "2024-01-15"	61.50	60.98
//! ```

use crate::domain::error::SnrError;
use crate::domain::series::{Series, day_index};
use crate::domain::trend::TrendModel;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXPORT_HEADER: [&str; 3] = ["Date", "Close price", "Predicted price"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendRow {
    pub date: NaiveDate,
    pub close: f64,
    pub predicted: f64,
}

impl TrendRow {
    pub fn day(&self) -> i64 {
        day_index(self.date)
    }
}

/// Path separators in instrument names become underscores.
pub fn export_file_name(ticker: &str, name: &str) -> String {
    format!("{ticker}-{name}-Price-with_trend.tsv").replace(['/', '\\'], "_")
}

/// Writes every point of `series` next to the model's prediction. Returns the
/// path written.
pub fn write_trend_export(
    dir: &Path,
    ticker: &str,
    name: &str,
    series: &Series,
    model: &TrendModel,
) -> Result<PathBuf, SnrError> {
    let file_name = export_file_name(ticker, name);
    let path = dir.join(&file_name);

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_path(&path)
        .map_err(into_io)?;

    wtr.write_record([file_name.as_str()]).map_err(into_io)?;
    wtr.write_record(EXPORT_HEADER).map_err(into_io)?;
    for point in series.points() {
        let predicted = 10f64.powf(model.predict(point.day as f64));
        wtr.write_record([
            point.date().format("%Y-%m-%d").to_string(),
            format!("{:.2}", point.price()),
            format!("{predicted:.2}"),
        ])
        .map_err(into_io)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), points = series.len(), "wrote trend export");
    Ok(path)
}

pub fn read_trend_export(path: &Path) -> Result<Vec<TrendRow>, SnrError> {
    let source_name = path.display().to_string();
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| SnrError::not_found(&source_name, e))?;

    let mut records = rdr.records();
    // Title line, then the column header.
    records.next();
    let header = records
        .next()
        .transpose()
        .map_err(|e| SnrError::format_mismatch(&source_name, e.to_string()))?;
    if !header.is_some_and(|h| h.iter().eq(EXPORT_HEADER)) {
        return Err(SnrError::format_mismatch(&source_name, "missing trend export header"));
    }

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| SnrError::format_mismatch(&source_name, e.to_string()))?;
        let row = parse_row(&record).ok_or_else(|| {
            SnrError::format_mismatch(&source_name, format!("malformed row: {record:?}"))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_row(record: &csv::StringRecord) -> Option<TrendRow> {
    Some(TrendRow {
        date: NaiveDate::parse_from_str(record.get(0)?, "%Y-%m-%d").ok()?,
        close: record.get(1)?.parse().ok()?,
        predicted: record.get(2)?.parse().ok()?,
    })
}

fn into_io(e: csv::Error) -> SnrError {
    SnrError::Io(std::io::Error::other(e))
}
