//! On-disk store for computed instrument statistics.
//!
//! One JSON file per [`CacheKey`] under `<cache_dir>/records/`. Entries are
//! replaced wholesale; a partial write never becomes visible because each
//! entry is written to a temporary file and renamed into place.

use crate::domain::error::SnrError;
use crate::domain::record::{CacheEntry, CacheKey};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RecordCache {
    dir: PathBuf,
}

impl RecordCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            dir: cache_dir.join("records"),
        }
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// Returns the stored entry for `key`, or `None` on any kind of miss.
    pub fn load(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!(identifier = key.identifier(), error = %e, "no cached record");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cached record");
                return None;
            }
        };
        if !entry.matches(key) {
            warn!(
                path = %path.display(),
                stored = %entry.identifier,
                requested = key.identifier(),
                "cached record belongs to another key"
            );
            return None;
        }
        if !entry.same_corrections(key) {
            debug!(
                identifier = key.identifier(),
                stored = %entry.corrections,
                current = key.corrections(),
                "price corrections changed since record was computed"
            );
            return None;
        }
        Some(entry)
    }

    pub fn store(&self, entry: &CacheEntry) -> Result<PathBuf, SnrError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(&entry.key());
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(entry).map_err(std::io::Error::other)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "stored record");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::InstrumentStats;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn stats(growth: f64) -> InstrumentStats {
        InstrumentStats {
            ticker: "ERIC".into(),
            display_name: "Ericsson".into(),
            last_updated: "2024-05-31".into(),
            f_score: Some(6),
            yearly_growth: growth,
            rmsd: 0.12,
            price_vs_trend: -0.03,
            full_years_covered: 9.8,
        }
    }

    #[test]
    fn store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = RecordCache::new(dir.path());
        let key = CacheKey::new("ERIC", 10.0);
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let entry = CacheEntry::new(&key, t, stats(0.2));

        let path = cache.store(&entry).unwrap();
        assert_eq!(path, cache.entry_path(&key));
        assert_eq!(path.parent(), Some(dir.path().join("records").as_path()));
        assert_eq!(cache.load(&key), Some(entry));
    }

    #[test]
    fn store_overwrites_previous_entry() {
        let dir = TempDir::new().unwrap();
        let cache = RecordCache::new(dir.path());
        let key = CacheKey::new("ERIC", 10.0);
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

        cache.store(&CacheEntry::new(&key, t, stats(0.2))).unwrap();
        cache.store(&CacheEntry::new(&key, t, stats(0.3))).unwrap();
        assert_eq!(cache.load(&key).unwrap().stats.yearly_growth, 0.3);
        assert!(!cache.entry_path(&key).with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_and_corrupt_entries_are_misses() {
        let dir = TempDir::new().unwrap();
        let cache = RecordCache::new(dir.path());
        let key = CacheKey::new("ERIC", 10.0);
        assert_eq!(cache.load(&key), None);

        fs::create_dir_all(dir.path().join("records")).unwrap();
        fs::write(cache.entry_path(&key), "{\"identifier\": 3").unwrap();
        assert_eq!(cache.load(&key), None);
    }

    #[test]
    fn similar_identifiers_do_not_share_a_file() {
        let dir = TempDir::new().unwrap();
        let cache = RecordCache::new(dir.path());
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let spaced = CacheKey::new("ERIC B", 10.0);
        let underscored = CacheKey::new("ERIC_B", 10.0);

        cache.store(&CacheEntry::new(&spaced, t, stats(0.2))).unwrap();
        cache.store(&CacheEntry::new(&underscored, t, stats(0.3))).unwrap();
        assert_eq!(cache.load(&spaced).unwrap().stats.yearly_growth, 0.2);
        assert_eq!(cache.load(&underscored).unwrap().stats.yearly_growth, 0.3);
    }

    #[test]
    fn entry_under_another_keys_name_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = RecordCache::new(dir.path());
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let stored = cache
            .store(&CacheEntry::new(&CacheKey::new("ERIC B", 10.0), t, stats(0.2)))
            .unwrap();
        let other = CacheKey::new("ERIC.B", 10.0);
        fs::copy(stored, cache.entry_path(&other)).unwrap();
        assert_eq!(cache.load(&other), None);
    }

    #[test]
    fn changed_corrections_are_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = RecordCache::new(dir.path());
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let plain = CacheKey::new("SPLT", 5.0);
        let corrected = plain.clone().with_corrections("1990-01-01..2023-06-30x0.5");

        cache.store(&CacheEntry::new(&plain, t, stats(0.05))).unwrap();
        assert_eq!(cache.load(&corrected), None);

        cache.store(&CacheEntry::new(&corrected, t, stats(0.2))).unwrap();
        assert_eq!(cache.load(&corrected).unwrap().stats.yearly_growth, 0.2);
        assert_eq!(cache.load(&plain), None);
    }

    #[test]
    fn windows_are_cached_separately() {
        let dir = TempDir::new().unwrap();
        let cache = RecordCache::new(dir.path());
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        cache
            .store(&CacheEntry::new(&CacheKey::new("ERIC", 10.0), t, stats(0.2)))
            .unwrap();
        assert_eq!(cache.load(&CacheKey::new("ERIC", 5.0)), None);
    }
}
