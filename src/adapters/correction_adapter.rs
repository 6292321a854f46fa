//! Correction table file adapter.
//!
//! CSV with a header row: `identifier,start,end,multiplier`, dates as
//! `YYYY-MM-DD`, the range inclusive.

use crate::domain::correction::{CorrectionTable, PriceCorrection};
use crate::domain::error::SnrError;
use std::path::Path;

pub fn load_corrections(path: &Path) -> Result<CorrectionTable, SnrError> {
    let source_name = path.display().to_string();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| SnrError::not_found(&source_name, e))?;

    let mut entries = Vec::new();
    for result in rdr.deserialize::<PriceCorrection>() {
        let entry = result.map_err(|e| SnrError::format_mismatch(&source_name, e.to_string()))?;
        if !(entry.multiplier > 0.0) || !entry.multiplier.is_finite() {
            return Err(SnrError::format_mismatch(
                &source_name,
                format!("multiplier for {} must be positive", entry.identifier),
            ));
        }
        if entry.end < entry.start {
            return Err(SnrError::format_mismatch(
                &source_name,
                format!("date range for {} ends before it starts", entry.identifier),
            ));
        }
        entries.push(entry);
    }
    Ok(CorrectionTable::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("corrections.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_entries() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "identifier,start,end,multiplier\n\
             # 4:1 split\n\
             INVE-B, 2000-01-01, 2015-05-12, 0.25\n\
             ABB,2001-01-01,2001-12-31,0.5\n",
        );
        let table = load_corrections(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.factor("INVE-B", NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()),
            0.25
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_corrections(&dir.path().join("none.csv")).unwrap_err();
        assert!(matches!(err, SnrError::NotFound { .. }));
    }

    #[test]
    fn rejects_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "identifier,start,end,multiplier\nX,2001-01-01,2001-12-31,0\n");
        assert!(matches!(
            load_corrections(&path),
            Err(SnrError::FormatMismatch { .. })
        ));

        let path = write(&dir, "identifier,start,end,multiplier\nX,2002-01-01,2001-12-31,2\n");
        assert!(matches!(
            load_corrections(&path),
            Err(SnrError::FormatMismatch { .. })
        ));

        let path = write(&dir, "identifier,start,end,multiplier\nX,yesterday,2001-12-31,2\n");
        assert!(matches!(
            load_corrections(&path),
            Err(SnrError::FormatMismatch { .. })
        ));
    }
}
