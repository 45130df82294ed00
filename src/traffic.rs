//! Per-station arrival and departure counts.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::model::{Station, StationTraffic, Trip};

/// Counts items per key.
fn rollup<'a, I, K, F>(items: I, key: F) -> HashMap<K, usize>
where
    I: IntoIterator<Item = &'a Trip>,
    K: Eq + Hash,
    F: Fn(&'a Trip) -> K,
{
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

/// Counts departures (by start station) and arrivals (by end station) for
/// every station.
///
/// Returns one [`StationTraffic`] per station, in station order. Stations
/// with no matching trips get zero counts. Trips whose station ids match no
/// station are ignored.
pub fn compute_station_traffic<'a, I>(stations: &[Station], trips: I) -> Vec<StationTraffic>
where
    I: IntoIterator<Item = &'a Trip>,
    I::IntoIter: Clone,
{
    let trips = trips.into_iter();
    let departures = rollup(trips.clone(), |t| t.start_station_id.as_str());
    let arrivals = rollup(trips, |t| t.end_station_id.as_str());

    stations
        .iter()
        .map(|station| {
            let id = station.short_name.as_str();
            StationTraffic::new(
                station.clone(),
                arrivals.get(id).copied().unwrap_or(0),
                departures.get(id).copied().unwrap_or(0),
            )
        })
        .collect()
}

/// Largest `total` over all stations, 0 when there are none.
pub fn max_total(traffic: &[StationTraffic]) -> usize {
    traffic.iter().map(|t| t.total).max().unwrap_or(0)
}

/// Headline numbers for one aggregation pass.
#[derive(Debug, Serialize)]
pub struct TrafficSummary {
    pub stations: usize,
    pub trips: usize,
    pub stations_with_traffic: usize,
    pub busiest_station: Option<String>,
    pub busiest_total: usize,
}

impl TrafficSummary {
    pub fn from_traffic(traffic: &[StationTraffic], trips: usize) -> Self {
        let busiest = traffic
            .iter()
            .filter(|t| t.total > 0)
            .max_by_key(|t| t.total);

        TrafficSummary {
            stations: traffic.len(),
            trips,
            stations_with_traffic: traffic.iter().filter(|t| t.total > 0).count(),
            busiest_station: busiest.map(|t| t.short_name().to_string()),
            busiest_total: busiest.map(|t| t.total).unwrap_or(0),
        }
    }
}
