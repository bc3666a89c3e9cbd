//! # GeoLife
//!
//! GPS trajectory loading and activity analytics for the GeoLife dataset layout.
//!
//! This library provides:
//! - Parsing of `.plt` trajectory files and per-user `labels.txt` files
//! - Activity assembly (timestamps, transportation mode, altitude delta)
//! - A SQLite-backed store for users, activities and trackpoints
//! - A fixed set of derived-metric queries over the stored data
//!
//! ## Quick Start
//!
//! ```no_run
//! use geolife::{Config, DataLoader, Queries, Store};
//!
//! let config = Config::default();
//! let mut store = Store::open(&config.db_path)?;
//!
//! DataLoader::new(&mut store, config.loader()).run(true)?;
//!
//! let report = Queries::new(&store, config.queries()).run(1)?;
//! if let Some(report) = report {
//!     println!("{}", report);
//! }
//! # Ok::<(), geolife::GeolifeError>(())
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{GeolifeError, OptionExt, Result};

// Record types shared by the loader, the store and the queries
pub mod types;
pub use types::{
    Activity, NewActivity, NewTrackpoint, Trackpoint, User, ALTITUDE_UNKNOWN, TIMESTAMP_FORMAT,
};

// Runtime configuration
pub mod config;
pub use config::{Config, LoaderConfig, QueryConfig};

// Geographic utilities (distance, bounds)
pub mod geo_utils;

// Input file parsing
pub mod labels;
pub use labels::LabelIndex;

pub mod trajectory;
pub use trajectory::{parse_trajectory, RawPoint};

// Activity assembly from parsed trajectories
pub mod assembler;
pub use assembler::{altitude_delta, assemble, exceeds_point_ceiling, AssembledActivity};

// SQLite storage
pub mod migrations;
pub mod store;
pub use store::Store;

// Directory walk and bulk insertion
pub mod loader;
pub use loader::{DataLoader, IngestStats};

// Derived-metric queries and report output
pub mod queries;
pub use queries::Queries;

pub mod report;
pub use report::Report;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use geolife::GpsPoint;
/// let point = GpsPoint::new(39.9163, 116.3972); // Beijing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Latitude/longitude rectangle.
///
/// Containment is half-open: the minimum edges are inside, the maximum edges
/// are not. The store evaluates it in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}
