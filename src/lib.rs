//! snrscan ranks instruments by how steadily their price trend grows.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. [`analysis`] ties one instrument's
//! source, record cache and trend fit together; [`cli`] runs a batch.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod logging;
