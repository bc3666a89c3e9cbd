//! # Geographic Utilities
//!
//! Distance computations over GPS tracks.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`polyline_length`] | Total length of a GPS track in meters |
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).
//!
//! ## Example
//!
//! ```rust
//! use geolife::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(39.9042, 116.4074),
//!     GpsPoint::new(39.9050, 116.4080),
//!     GpsPoint::new(39.9060, 116.4090),
//! ];
//!
//! let length = geo_utils::polyline_length(&track);
//! println!("Track length: {:.0}m", length);
//! ```

use geo::{Distance, Haversine, Point};

use crate::GpsPoint;

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns meters along a spherical Earth of mean radius 6,371 km.
///
/// ```rust
/// use geolife::{GpsPoint, geo_utils};
///
/// let beijing = GpsPoint::new(39.9042, 116.4074);
/// let shanghai = GpsPoint::new(31.2304, 121.4737);
///
/// let distance = geo_utils::haversine_distance(&beijing, &shanghai);
/// assert!((distance - 1_067_000.0).abs() < 5_000.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2)
}

/// Calculate the total length of a polyline in meters.
///
/// Sums the haversine distance between consecutive points in the given order.
/// Empty or single-point tracks return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let p = GpsPoint::new(39.9, 116.4);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = GpsPoint::new(39.0, 116.4);
        let b = GpsPoint::new(40.0, 116.4);
        let d = haversine_distance(&a, &b);
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_polyline_colinear_is_twice_segment() {
        // Points on one meridian, equally spaced (~1 km apart)
        let track = vec![
            GpsPoint::new(39.900, 116.4),
            GpsPoint::new(39.909, 116.4),
            GpsPoint::new(39.918, 116.4),
        ];
        let segment = haversine_distance(&track[0], &track[1]);
        let total = polyline_length(&track);
        assert!((segment - 1000.0).abs() < 10.0);
        assert!((total - 2.0 * segment).abs() < 1e-6);
    }

    #[test]
    fn test_polyline_short_tracks() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GpsPoint::new(39.9, 116.4)]), 0.0);
    }
}
