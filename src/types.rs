//! Record types for persistence and queries.
//!
//! `New*` records are produced by the assembler and carry no storage id yet.
//! The plain records are what the store hands back.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::GpsPoint;

/// Altitude value GeoLife writes when the receiver had no altitude fix.
pub const ALTITUDE_UNKNOWN: f64 = -777.0;

/// Text form of every timestamp in the dataset and in the database.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub has_labels: bool,
}

// ============================================================================
// Activities
// ============================================================================

/// Activity summary ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub user_id: String,
    pub transportation_mode: Option<String>,
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    /// First-difference sum of known altitudes, in feet
    pub altitude_diff: Option<f64>,
}

/// A stored activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub user_id: String,
    pub transportation_mode: Option<String>,
    pub start_date_time: NaiveDateTime,
    pub end_date_time: NaiveDateTime,
    pub altitude_diff: Option<f64>,
}

impl Activity {
    /// Calendar year of the start timestamp.
    pub fn start_year(&self) -> i32 {
        self.start_date_time.year()
    }

    /// Elapsed time between start and end, in hours.
    pub fn duration_hours(&self) -> f64 {
        let millis = (self.end_date_time - self.start_date_time).num_milliseconds();
        millis as f64 / 3_600_000.0
    }
}

// ============================================================================
// Trackpoints
// ============================================================================

/// One GPS sample ready to be inserted under an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrackpoint {
    pub lat: f64,
    pub lon: f64,
    /// Altitude in feet, [`ALTITUDE_UNKNOWN`] when missing
    pub altitude: f64,
    /// Days elapsed since 1899-12-30, as written by the recorder
    pub date_days: f64,
    pub date_time: NaiveDateTime,
}

/// A stored trackpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trackpoint {
    pub id: i64,
    pub activity_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub altitude: f64,
    pub date_days: f64,
    pub date_time: NaiveDateTime,
}

impl Trackpoint {
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn test_activity_duration_and_year() {
        let activity = Activity {
            id: 1,
            user_id: "010".to_string(),
            transportation_mode: None,
            start_date_time: at("2008-12-31 23:30:00"),
            end_date_time: at("2009-01-01 01:00:00"),
            altitude_diff: None,
        };
        assert_eq!(activity.start_year(), 2008);
        assert!((activity.duration_hours() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_activity_json_roundtrip() {
        let activity = Activity {
            id: 7,
            user_id: "112".to_string(),
            transportation_mode: Some("walk".to_string()),
            start_date_time: at("2008-05-01 08:00:00"),
            end_date_time: at("2008-05-01 08:30:00"),
            altitude_diff: Some(12.5),
        };
        let json = serde_json::to_string(&activity).unwrap();
        assert!(json.contains("2008-05-01T08:00:00"));

        let back: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, activity);
    }
}
