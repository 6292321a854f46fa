//! Record cache entries and their validity rules.
//!
//! A [`CacheEntry`] stores the derived statistics for one
//! (identifier, lookback window) pair. Whether a stored entry may be reused
//! depends on where the prices came from, so each source supplies a
//! [`Validity`] rule.

use crate::domain::signal::InstrumentStats;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Freshness window for statistics computed from a remote source.
pub fn default_record_max_age() -> TimeDelta {
    TimeDelta::days(1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    identifier: String,
    years: f64,
    corrections: String,
}

impl CacheKey {
    /// `identifier` must already be normalized (uppercased ticker or canonical path).
    pub fn new(identifier: impl Into<String>, years: f64) -> Self {
        Self {
            identifier: identifier.into(),
            years,
            corrections: String::new(),
        }
    }

    /// Ties the key to the price corrections applied when computing it.
    /// See `CorrectionTable::fingerprint`.
    pub fn with_corrections(mut self, fingerprint: impl Into<String>) -> Self {
        self.corrections = fingerprint.into();
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn years(&self) -> f64 {
        self.years
    }

    pub fn corrections(&self) -> &str {
        &self.corrections
    }

    /// File-system safe name. The readable part is lossy, so a hash of the
    /// full identifier keeps distinct identifiers in distinct files.
    pub fn file_stem(&self) -> String {
        let name: String = self
            .identifier
            .trim_start_matches('/')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let years = format!("{}", self.years).replace('.', "_");
        format!("{name}__{years}y_{:08x}", identifier_hash(&self.identifier))
    }
}

fn identifier_hash(identifier: &str) -> u32 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut h = DefaultHasher::new();
    identifier.hash(&mut h);
    h.finish() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub identifier: String,
    pub years: f64,
    #[serde(default)]
    pub corrections: String,
    pub computed_at: DateTime<Utc>,
    pub stats: InstrumentStats,
}

impl CacheEntry {
    pub fn new(key: &CacheKey, computed_at: DateTime<Utc>, stats: InstrumentStats) -> Self {
        Self {
            identifier: key.identifier.clone(),
            years: key.years,
            corrections: key.corrections.clone(),
            computed_at,
            stats,
        }
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.identifier.clone(), self.years)
            .with_corrections(self.corrections.clone())
    }

    /// Same instrument and window; says nothing about corrections.
    pub fn matches(&self, key: &CacheKey) -> bool {
        self.identifier == key.identifier && self.years == key.years
    }

    pub fn same_corrections(&self, key: &CacheKey) -> bool {
        self.corrections == key.corrections
    }
}

/// Decides whether a stored entry is still usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validity {
    /// File-backed sources: the entry must be strictly newer than the input artifact.
    NewerThan(DateTime<Utc>),
    /// Remote sources: the entry must be younger than the freshness window.
    MaxAge(TimeDelta),
}

impl Validity {
    pub fn accepts(&self, computed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match *self {
            Self::NewerThan(modified) => computed_at > modified,
            Self::MaxAge(max_age) => now - computed_at < max_age,
        }
    }
}

/// How a statistics request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// A stored entry passed validation.
    Fresh,
    /// Statistics were computed and written.
    Recomputed,
}
