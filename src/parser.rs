//! Decoders for the station metadata JSON and the trip CSV.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::model::{Station, Trip};

#[derive(Deserialize)]
struct StationDocument {
    data: StationData,
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<StationRecord>,
}

#[derive(Deserialize)]
struct StationRecord {
    short_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(deserialize_with = "number_or_string")]
    lat: f64,
    #[serde(deserialize_with = "number_or_string")]
    lon: f64,
}

/// Coordinates show up both as JSON numbers and as numeric strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Decodes a `{"data": {"stations": [...]}}` document.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON of that shape or a coordinate
/// is not numeric.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let doc: StationDocument =
        serde_json::from_slice(bytes).context("station document is not valid JSON")?;

    Ok(doc
        .data
        .stations
        .into_iter()
        .map(|r| Station {
            short_name: r.short_name,
            name: r.name,
            lon: r.lon,
            lat: r.lat,
        })
        .collect())
}

#[derive(Deserialize)]
struct TripRecord {
    #[serde(default)]
    ride_id: Option<String>,
    #[serde(default)]
    rideable_type: Option<String>,
    start_station_id: String,
    end_station_id: String,
    started_at: String,
    ended_at: String,
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a trip timestamp into local wall-clock time.
///
/// Offset-carrying RFC 3339 values keep the wall-clock time of their own
/// offset.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| anyhow!("unrecognized timestamp '{value}'"))
}

/// Decodes a headed trip CSV. Columns other than the ones a [`Trip`]
/// needs are ignored.
///
/// # Errors
///
/// Returns an error naming the row when a record is missing a required
/// column or carries an unparseable timestamp.
pub fn parse_trips(bytes: &[u8]) -> Result<Vec<Trip>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut trips = Vec::new();

    for (row, result) in rdr.deserialize::<TripRecord>().enumerate() {
        let record = result.with_context(|| format!("trip row {}", row + 1))?;
        let started_at = parse_timestamp(&record.started_at)
            .with_context(|| format!("trip row {}: started_at", row + 1))?;
        let ended_at = parse_timestamp(&record.ended_at)
            .with_context(|| format!("trip row {}: ended_at", row + 1))?;

        trips.push(Trip {
            ride_id: record.ride_id.filter(|s| !s.is_empty()),
            rideable_type: record.rideable_type.filter(|s| !s.is_empty()),
            start_station_id: record.start_station_id,
            end_station_id: record.end_station_id,
            started_at,
            ended_at,
        });
    }

    Ok(trips)
}
