//! Startup loading of the station and trip sources.

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::fetch::{HttpClient, read_source};
use crate::model::{Station, Trip};
use crate::parser::{parse_stations, parse_trips};

/// Public station metadata used when no source is configured.
pub const DEFAULT_STATIONS_URL: &str = "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";

/// Public trip export used when no source is configured.
pub const DEFAULT_TRIPS_URL: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";

/// Loads and decodes the station list.
///
/// # Errors
///
/// A failed load is logged and returned; there is no fallback station list.
#[tracing::instrument(skip(client))]
pub async fn load_stations<C: HttpClient>(client: &C, source: &str) -> Result<Vec<Station>> {
    let result = async {
        let bytes = read_source(client, source).await?;
        parse_stations(&bytes)
    }
    .await
    .with_context(|| format!("loading stations from {source}"));

    match result {
        Ok(stations) => {
            info!(count = stations.len(), "Stations loaded");
            Ok(stations)
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to load stations");
            Err(e)
        }
    }
}

/// Loads and decodes the trip list.
#[tracing::instrument(skip(client))]
pub async fn load_trips<C: HttpClient>(client: &C, source: &str) -> Result<Vec<Trip>> {
    let bytes = read_source(client, source).await?;
    let trips = parse_trips(&bytes).with_context(|| format!("loading trips from {source}"))?;
    info!(count = trips.len(), "Trips loaded");
    Ok(trips)
}
