//! Time-of-day filtering of trips.

use anyhow::{Result, bail};
use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::model::Trip;

/// Half-width of the window around the selected minute, inclusive.
pub const WINDOW_MINUTES: u32 = 60;

/// Last minute of the day a slider can select.
pub const LAST_MINUTE: u32 = 24 * 60 - 1;

/// Slider value that disables filtering.
pub const ANY_TIME: i32 = -1;

/// The time-of-day a user selected, or no selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Any,
    Minute(u32),
}

impl TimeFilter {
    /// Validates a raw slider value. `-1` maps to [`TimeFilter::Any`].
    ///
    /// # Errors
    ///
    /// Returns an error for values outside `[-1, 1439]`.
    pub fn from_slider(value: i32) -> Result<Self> {
        match value {
            ANY_TIME => Ok(TimeFilter::Any),
            v if (0..=LAST_MINUTE as i32).contains(&v) => Ok(TimeFilter::Minute(v as u32)),
            v => bail!("time slider value {v} is outside [-1, {LAST_MINUTE}]"),
        }
    }

    pub fn slider_value(&self) -> i32 {
        match self {
            TimeFilter::Any => ANY_TIME,
            TimeFilter::Minute(m) => *m as i32,
        }
    }

    /// Human readable form of the selection, e.g. `"9:05 AM"`.
    pub fn label(&self) -> String {
        match self {
            TimeFilter::Any => "(any time)".to_string(),
            TimeFilter::Minute(m) => NaiveTime::from_hms_opt(m / 60, m % 60, 0)
                .map(|t| t.format("%-I:%M %p").to_string())
                .unwrap_or_default(),
        }
    }

    fn matches(&self, trip: &Trip) -> bool {
        match self {
            TimeFilter::Any => true,
            TimeFilter::Minute(selected) => {
                within_window(minutes_since_midnight(&trip.started_at), *selected)
                    || within_window(minutes_since_midnight(&trip.ended_at), *selected)
            }
        }
    }
}

/// Minutes elapsed since local midnight, ignoring seconds.
pub fn minutes_since_midnight(timestamp: &NaiveDateTime) -> u32 {
    timestamp.hour() * 60 + timestamp.minute()
}

// No wrap across midnight: 00:05 and 23:58 are 1433 minutes apart.
fn within_window(minutes: u32, selected: u32) -> bool {
    minutes.abs_diff(selected) <= WINDOW_MINUTES
}

/// Keeps trips that started or ended within [`WINDOW_MINUTES`] of the
/// selected time, in their original order. [`TimeFilter::Any`] keeps all.
pub fn filter_trips_by_time(trips: &[Trip], filter: TimeFilter) -> Vec<&Trip> {
    match filter {
        TimeFilter::Any => trips.iter().collect(),
        _ => trips.iter().filter(|trip| filter.matches(trip)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 42)
            .unwrap()
    }

    fn trip(start: NaiveDateTime, end: NaiveDateTime) -> Trip {
        Trip::new("A", "B", start, end)
    }

    #[test]
    fn test_minutes_since_midnight() {
        assert_eq!(minutes_since_midnight(&at(0, 0)), 0);
        assert_eq!(minutes_since_midnight(&at(1, 40)), 100);
        assert_eq!(minutes_since_midnight(&at(23, 59)), 1439);
    }

    #[test]
    fn test_any_returns_every_trip_in_order() {
        let trips = vec![trip(at(8, 0), at(8, 30)), trip(at(1, 0), at(1, 5))];
        let filtered = filter_trips_by_time(&trips, TimeFilter::Any);

        assert_eq!(filtered.len(), 2);
        assert!(std::ptr::eq(filtered[0], &trips[0]));
        assert!(std::ptr::eq(filtered[1], &trips[1]));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        // started at minute 100, ended at minute 300
        let trips = vec![trip(at(1, 40), at(5, 0))];

        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(160)).len(), 1);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(162)).len(), 0);
        assert_eq!(filter_trips_by_time(&trips, TimeFilter::Minute(240)).len(), 1);
    }

    #[test]
    fn test_window_does_not_wrap_midnight() {
        let trips = vec![trip(at(23, 58), at(23, 59))];
        assert!(filter_trips_by_time(&trips, TimeFilter::Minute(5)).is_empty());
    }

    #[test]
    fn test_filter_preserves_order() {
        let trips = vec![
            trip(at(9, 0), at(9, 10)),
            trip(at(14, 0), at(14, 10)),
            trip(at(9, 30), at(9, 45)),
        ];
        let filtered = filter_trips_by_time(&trips, TimeFilter::Minute(9 * 60));

        assert_eq!(filtered.len(), 2);
        assert!(std::ptr::eq(filtered[0], &trips[0]));
        assert!(std::ptr::eq(filtered[1], &trips[2]));
    }

    #[test]
    fn test_from_slider() {
        assert_eq!(TimeFilter::from_slider(-1).unwrap(), TimeFilter::Any);
        assert_eq!(TimeFilter::from_slider(0).unwrap(), TimeFilter::Minute(0));
        assert_eq!(TimeFilter::from_slider(1439).unwrap(), TimeFilter::Minute(1439));
        assert!(TimeFilter::from_slider(1440).is_err());
        assert!(TimeFilter::from_slider(-2).is_err());
        assert_eq!(TimeFilter::Minute(75).slider_value(), 75);
    }

    #[test]
    fn test_label() {
        assert_eq!(TimeFilter::Any.label(), "(any time)");
        assert_eq!(TimeFilter::Minute(0).label(), "12:00 AM");
        assert_eq!(TimeFilter::Minute(9 * 60 + 5).label(), "9:05 AM");
        assert_eq!(TimeFilter::Minute(13 * 60 + 30).label(), "1:30 PM");
    }
}
