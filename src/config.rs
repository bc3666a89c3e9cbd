//! Runtime configuration.
//!
//! Every field has a default matching the GeoLife layout and the fixed report
//! parameters, so a config file only needs to list what it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Bounds, GeolifeError, Result};

/// Top-level configuration shared by the loader and the query runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset root containing `labeled_ids.txt` and `Data/`.
    /// Default: "./dataset"
    pub data_dir: PathBuf,

    /// SQLite database file.
    /// Default: "geolife.db"
    pub db_path: PathBuf,

    /// Trajectories with more rows than this are not loaded.
    /// Default: 2500
    pub max_trackpoints_per_activity: usize,

    /// Consecutive trackpoints further apart than this mark an activity invalid.
    /// Default: 5 minutes
    pub gap_threshold_minutes: i64,

    /// Row limit for ranking reports.
    /// Default: 20
    pub top_n: usize,

    /// Mode used by the "users who took a ..." report.
    /// Default: "taxi"
    pub filter_mode: String,

    /// User, mode and calendar year of the distance report.
    /// Default: "112", "walk", 2008
    pub distance_user: String,
    pub distance_mode: String,
    pub distance_year: i32,

    /// Rectangle for the geofence report.
    /// Default: the Forbidden City, lat [39.916, 39.917), lon [116.397, 116.398)
    pub geofence: Bounds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./dataset"),
            db_path: PathBuf::from("geolife.db"),
            max_trackpoints_per_activity: 2500,
            gap_threshold_minutes: 5,
            top_n: 20,
            filter_mode: "taxi".to_string(),
            distance_user: "112".to_string(),
            distance_mode: "walk".to_string(),
            distance_year: 2008,
            geofence: Bounds {
                min_lat: 39.916,
                max_lat: 39.917,
                min_lng: 116.397,
                max_lng: 116.398,
            },
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| GeolifeError::file_access(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GeolifeError::Config {
            message: e.to_string(),
        })
    }

    pub fn loader(&self) -> LoaderConfig {
        LoaderConfig {
            data_dir: self.data_dir.clone(),
            max_trackpoints_per_activity: self.max_trackpoints_per_activity,
        }
    }

    pub fn queries(&self) -> QueryConfig {
        QueryConfig {
            gap_threshold_minutes: self.gap_threshold_minutes,
            top_n: self.top_n,
            filter_mode: self.filter_mode.clone(),
            distance_user: self.distance_user.clone(),
            distance_mode: self.distance_mode.clone(),
            distance_year: self.distance_year,
            geofence: self.geofence,
        }
    }
}

/// Settings for [`crate::DataLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    pub data_dir: PathBuf,
    pub max_trackpoints_per_activity: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Config::default().loader()
    }
}

/// Settings for [`crate::Queries`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub gap_threshold_minutes: i64,
    pub top_n: usize,
    pub filter_mode: String,
    pub distance_user: String,
    pub distance_mode: String,
    pub distance_year: i32,
    pub geofence: Bounds,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Config::default().queries()
    }
}
