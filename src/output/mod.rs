//! Output formatters for decoded beacon records.
//!
//! This module provides a trait for formatting records and implementations
//! for the supported output formats: the compact JSON wire form and InfluxDB
//! line protocol.

pub mod influxdb;
pub mod json;

use crate::beacon::BeaconRecord;

/// Trait for formatting beacon records into output lines.
///
/// Implementations convert a `BeaconRecord` into a single line of text
/// suitable for a specific sink (terminal, Telegraf, log file).
pub trait OutputFormatter: Send + Sync {
    /// Format a record.
    ///
    /// # Arguments
    /// * `record` - The decoded beacon record
    ///
    /// # Returns
    /// A formatted single-line representation of the record
    fn format(&self, record: &BeaconRecord) -> String;
}

/// Available output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    /// Compact JSON wire map, one object per line
    #[default]
    Json,
    /// InfluxDB line protocol
    Influxdb,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Influxdb => write!(f, "influxdb"),
        }
    }
}
