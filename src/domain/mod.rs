//! Core domain types and logic.

pub mod series;
pub mod trend;
pub mod signal;
pub mod ranking;
pub mod correction;
pub mod record;
pub mod settings;
pub mod error;
