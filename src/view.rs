//! Keeps station markers in step with the time slider and the map camera.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::{Station, StationTraffic, Trip};
use crate::scale::{MAX_RADIUS, RadiusScale};
use crate::time_filter::{TimeFilter, filter_trips_by_time};
use crate::traffic::{compute_station_traffic, max_total};
use crate::viewport::{Viewport, ViewportSubscription};

/// One station's circle on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub short_name: String,
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub arrivals: usize,
    pub departures: usize,
    pub total: usize,
    pub title: String,
}

fn tooltip(traffic: &StationTraffic) -> String {
    format!(
        "{} trips ({} departures, {} arrivals)",
        traffic.total, traffic.departures, traffic.arrivals
    )
}

/// Owns the loaded data, the radius scale and the markers.
///
/// The scale domain is fixed from the unfiltered traffic at construction,
/// so radii stay comparable while the slider moves.
pub struct ViewController<V: Viewport> {
    viewport: V,
    subscription: ViewportSubscription,
    stations: Vec<Station>,
    trips: Vec<Trip>,
    scale: RadiusScale,
    time_filter: TimeFilter,
    traffic: Vec<StationTraffic>,
    markers: Vec<Marker>,
}

impl<V: Viewport> ViewController<V> {
    pub fn new(viewport: V, stations: Vec<Station>, trips: Vec<Trip>) -> Self {
        let traffic = compute_station_traffic(&stations, &trips);
        let scale = RadiusScale::sqrt(max_total(&traffic), MAX_RADIUS);
        let subscription = viewport.subscribe();

        let markers = stations
            .iter()
            .map(|station| {
                let p = viewport.project(station.lon, station.lat);
                Marker {
                    short_name: station.short_name.clone(),
                    cx: p.x,
                    cy: p.y,
                    r: 0.0,
                    arrivals: 0,
                    departures: 0,
                    total: 0,
                    title: String::new(),
                }
            })
            .collect();

        let mut controller = Self {
            viewport,
            subscription,
            stations,
            trips,
            scale,
            time_filter: TimeFilter::Any,
            traffic,
            markers,
        };
        controller.apply_traffic();

        info!(
            stations = controller.stations.len(),
            trips = controller.trips.len(),
            max_total = controller.scale.domain_max(),
            "View initialized"
        );
        controller
    }

    /// Handles a time slider input: refilters trips, recounts traffic and
    /// resizes every marker.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the view untouched, when `value` is not a
    /// valid slider position.
    pub fn on_slider_input(&mut self, value: i32) -> Result<()> {
        let filter = TimeFilter::from_slider(value)?;
        let filtered = filter_trips_by_time(&self.trips, filter);
        let trip_count = filtered.len();

        self.traffic = compute_station_traffic(&self.stations, filtered);
        self.time_filter = filter;
        self.apply_traffic();

        debug!(time = %filter.label(), trips = trip_count, "Markers resized");
        Ok(())
    }

    /// Re-projects marker centers if the camera moved since the last call.
    /// Returns whether anything was repositioned.
    pub fn sync_positions(&mut self) -> bool {
        if !self.subscription.take_change() {
            return false;
        }
        for (marker, station) in self.markers.iter_mut().zip(&self.stations) {
            let p = self.viewport.project(station.lon, station.lat);
            marker.cx = p.x;
            marker.cy = p.y;
        }
        true
    }

    fn apply_traffic(&mut self) {
        for (marker, traffic) in self.markers.iter_mut().zip(&self.traffic) {
            marker.r = self.scale.radius(traffic.total);
            marker.arrivals = traffic.arrivals;
            marker.departures = traffic.departures;
            marker.total = traffic.total;
            marker.title = tooltip(traffic);
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn traffic(&self) -> &[StationTraffic] {
        &self.traffic
    }

    pub fn time_filter(&self) -> TimeFilter {
        self.time_filter
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{MapOptions, MercatorViewport};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn controller() -> ViewController<MercatorViewport> {
        let stations = vec![
            Station::new("A", -71.09, 42.36),
            Station::new("B", -71.06, 42.35),
        ];
        let trips = vec![
            Trip::new("A", "B", at(8, 0), at(8, 20)),
            Trip::new("A", "A", at(8, 30), at(8, 50)),
            Trip::new("B", "A", at(17, 0), at(17, 15)),
            Trip::new("A", "B", at(17, 30), at(17, 45)),
        ];
        ViewController::new(MercatorViewport::new(MapOptions::default()), stations, trips)
    }

    #[test]
    fn test_initial_markers_show_all_trips() {
        let view = controller();
        let markers = view.markers();

        assert_eq!(view.time_filter(), TimeFilter::Any);
        assert_eq!(markers[0].total, 5);
        assert_eq!(markers[0].r, MAX_RADIUS);
        assert_eq!(markers[1].total, 3);
        assert_eq!(markers[0].title, "5 trips (3 departures, 2 arrivals)");
        assert!(markers[1].r < markers[0].r);
    }

    #[test]
    fn test_slider_input_resizes_without_rescaling() {
        let mut view = controller();
        view.on_slider_input(8 * 60).unwrap();

        let markers = view.markers();
        assert_eq!(view.time_filter(), TimeFilter::Minute(480));
        assert_eq!(markers[0].total, 3);
        assert_eq!(markers[1].total, 1);
        assert_eq!(markers[0].r, RadiusScale::sqrt(5, MAX_RADIUS).radius(3));
        assert_eq!(markers[1].title, "1 trips (0 departures, 1 arrivals)");
    }

    #[test]
    fn test_slider_back_to_any_restores_totals() {
        let mut view = controller();
        view.on_slider_input(3 * 60).unwrap();
        assert!(view.markers().iter().all(|m| m.total == 0 && m.r == 0.0));

        view.on_slider_input(-1).unwrap();
        assert_eq!(view.markers()[0].total, 5);
        assert_eq!(view.traffic()[1].total, 3);
    }

    #[test]
    fn test_invalid_slider_value_keeps_view() {
        let mut view = controller();
        view.on_slider_input(17 * 60).unwrap();
        let before = view.markers().to_vec();

        assert!(view.on_slider_input(2000).is_err());
        assert_eq!(view.markers(), before.as_slice());
        assert_eq!(view.time_filter(), TimeFilter::Minute(1020));
    }

    #[test]
    fn test_positions_follow_camera_only() {
        let mut view = controller();
        assert!(!view.sync_positions());

        let before = view.markers()[0].cx;
        view.on_slider_input(600).unwrap();
        assert!(!view.sync_positions());
        assert_eq!(view.markers()[0].cx, before);

        view.viewport().pan_to(-71.0, 42.36);
        assert!(view.sync_positions());
        assert!(view.markers()[0].cx < before);
        assert!(!view.sync_positions());
    }

    #[test]
    fn test_larger_total_never_gets_smaller_radius() {
        let view = controller();
        let mut markers = view.markers().to_vec();
        markers.sort_by_key(|m| m.total);
        assert!(markers.windows(2).all(|w| w[0].r <= w[1].r));
    }
}
