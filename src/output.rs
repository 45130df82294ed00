//! Output formatting and persistence for station traffic.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::model::StationTraffic;
use crate::time_filter::TimeFilter;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One CSV row: a station's traffic under one time filter.
#[derive(Debug, Serialize)]
pub struct TrafficRow<'a> {
    pub generated_at: DateTime<Utc>,
    pub time_filter: i32,
    pub short_name: &'a str,
    pub lon: f64,
    pub lat: f64,
    pub arrivals: usize,
    pub departures: usize,
    pub total: usize,
}

impl<'a> TrafficRow<'a> {
    pub fn new(generated_at: DateTime<Utc>, filter: TimeFilter, traffic: &'a StationTraffic) -> Self {
        Self {
            generated_at,
            time_filter: filter.slider_value(),
            short_name: traffic.short_name(),
            lon: traffic.station.lon,
            lat: traffic.station.lat,
            arrivals: traffic.arrivals,
            departures: traffic.departures,
            total: traffic.total,
        }
    }
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    info!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends one row per station to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, filter: TimeFilter, traffic: &[StationTraffic]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = traffic.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    let now = Utc::now();
    for t in traffic {
        writer.serialize(TrafficRow::new(now, filter, t))?;
    }
    writer.flush()?;

    Ok(())
}
