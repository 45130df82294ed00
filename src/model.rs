//! Station and trip records shared by the filter, aggregator and view.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A bike-share dock location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub short_name: String,
    pub name: Option<String>,
    pub lon: f64,
    pub lat: f64,
}

impl Station {
    pub fn new(short_name: &str, lon: f64, lat: f64) -> Self {
        Self {
            short_name: short_name.to_string(),
            name: None,
            lon,
            lat,
        }
    }
}

/// One rental, from a start station to an end station.
///
/// Station ids are not required to reference a known [`Station`].
/// Timestamps are local wall-clock times.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub ride_id: Option<String>,
    pub rideable_type: Option<String>,
    pub start_station_id: String,
    pub end_station_id: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

impl Trip {
    pub fn new(
        start_station_id: &str,
        end_station_id: &str,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
    ) -> Self {
        Self {
            ride_id: None,
            rideable_type: None,
            start_station_id: start_station_id.to_string(),
            end_station_id: end_station_id.to_string(),
            started_at,
            ended_at,
        }
    }
}

/// A station together with the traffic counted for it in one aggregation pass.
///
/// Built fresh on every pass; `total` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTraffic {
    pub station: Station,
    pub arrivals: usize,
    pub departures: usize,
    pub total: usize,
}

impl StationTraffic {
    pub fn new(station: Station, arrivals: usize, departures: usize) -> Self {
        Self {
            station,
            arrivals,
            departures,
            total: arrivals + departures,
        }
    }

    pub fn short_name(&self) -> &str {
        &self.station.short_name
    }
}
