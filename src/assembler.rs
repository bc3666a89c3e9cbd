//! Turn a parsed trajectory into an activity summary and its trackpoints.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::trajectory::HEADER_LINES;
use crate::{
    GeolifeError, LabelIndex, NewActivity, NewTrackpoint, RawPoint, Result, ALTITUDE_UNKNOWN,
    TIMESTAMP_FORMAT,
};

/// An activity and its trackpoints, ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledActivity {
    pub activity: NewActivity,
    /// Same order as the trajectory file
    pub trackpoints: Vec<NewTrackpoint>,
}

/// True when a trajectory has too many rows to be loaded.
///
/// Applied to the raw row count, before sentinel altitudes are dropped.
#[inline]
pub fn exceeds_point_ceiling(point_count: usize, ceiling: usize) -> bool {
    point_count > ceiling
}

/// Build the activity for `user_id` from its trajectory rows.
///
/// The start and end timestamps come from the first and last rows. The
/// transportation mode is the label stored for exactly that pair, if any.
/// `source` is only used in error messages.
pub fn assemble(
    user_id: &str,
    points: &[RawPoint],
    labels: &LabelIndex,
    source: &Path,
) -> Result<AssembledActivity> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(GeolifeError::parse(
                source,
                HEADER_LINES,
                "trajectory has no points",
            ))
        }
    };

    let start = first.timestamp_string();
    let end = last.timestamp_string();
    let transportation_mode = labels.lookup(&start, &end).map(str::to_string);

    let trackpoints = points
        .iter()
        .map(|p| {
            Ok(NewTrackpoint {
                lat: p.latitude,
                lon: p.longitude,
                altitude: p.altitude,
                date_days: p.date_days,
                date_time: parse_timestamp(&p.timestamp_string(), source, p.line)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Trackpoints mirror the rows, so the endpoints are already parsed
    let start_date_time = trackpoints[0].date_time;
    let end_date_time = trackpoints[trackpoints.len() - 1].date_time;

    Ok(AssembledActivity {
        activity: NewActivity {
            user_id: user_id.to_string(),
            transportation_mode,
            start_date_time,
            end_date_time,
            altitude_diff: Some(altitude_delta(points)),
        },
        trackpoints,
    })
}

/// Sum of consecutive altitude differences, skipping unknown altitudes.
///
/// This telescopes to `last - first` over the known altitudes: it is the net
/// change, not the climbed elevation. Fewer than two known altitudes give 0.
pub fn altitude_delta(points: &[RawPoint]) -> f64 {
    let known: Vec<f64> = points
        .iter()
        .map(|p| p.altitude)
        .filter(|&alt| alt != ALTITUDE_UNKNOWN)
        .collect();

    known.windows(2).map(|w| w[1] - w[0]).sum()
}

fn parse_timestamp(text: &str, source: &Path, line: usize) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|e| GeolifeError::parse(source, line, format!("bad timestamp '{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn point(altitude: f64, time: &str) -> RawPoint {
        RawPoint {
            latitude: 39.9,
            longitude: 116.4,
            altitude,
            date_days: 39744.5,
            date: "2008-10-23".to_string(),
            time: time.to_string(),
            line: 0,
        }
    }

    fn labels(text: &str) -> LabelIndex {
        LabelIndex::from_reader(Cursor::new(text), Path::new("labels.txt")).unwrap()
    }

    #[test]
    fn test_timestamps_from_first_and_last_rows() {
        let points = vec![
            point(100.0, "02:53:04"),
            point(110.0, "02:55:00"),
            point(120.0, "03:10:30"),
        ];
        let assembled = assemble("000", &points, &LabelIndex::default(), Path::new("a.plt"))
            .unwrap();

        let activity = &assembled.activity;
        assert_eq!(activity.user_id, "000");
        assert_eq!(
            activity.start_date_time.format(TIMESTAMP_FORMAT).to_string(),
            "2008-10-23 02:53:04"
        );
        assert_eq!(
            activity.end_date_time.format(TIMESTAMP_FORMAT).to_string(),
            "2008-10-23 03:10:30"
        );
        assert_eq!(activity.transportation_mode, None);
        assert_eq!(assembled.trackpoints.len(), 3);
        assert_eq!(assembled.trackpoints[1].altitude, 110.0);
    }

    #[test]
    fn test_mode_from_exact_label_match() {
        let index = labels(
            "Start Time\tEnd Time\tTransportation Mode\n\
             2008/10/23 02:53:04\t2008/10/23 03:10:30\twalk\n\
             2008/10/23 02:53:04\t2008/10/23 03:10:31\tbus\n",
        );
        let points = vec![point(100.0, "02:53:04"), point(120.0, "03:10:30")];
        let assembled = assemble("010", &points, &index, Path::new("a.plt")).unwrap();
        assert_eq!(assembled.activity.transportation_mode.as_deref(), Some("walk"));

        let points = vec![point(100.0, "02:53:05"), point(120.0, "03:10:30")];
        let assembled = assemble("010", &points, &index, Path::new("b.plt")).unwrap();
        assert_eq!(assembled.activity.transportation_mode, None);
    }

    #[test]
    fn test_altitude_delta_skips_unknown() {
        let points = vec![
            point(-777.0, "00:00:00"),
            point(100.0, "00:00:01"),
            point(250.0, "00:00:02"),
            point(-777.0, "00:00:03"),
            point(80.0, "00:00:04"),
            point(-777.0, "00:00:05"),
        ];
        // last known - first known
        assert_eq!(altitude_delta(&points), -20.0);
    }

    #[test]
    fn test_altitude_delta_is_net_not_climb() {
        let points = vec![
            point(0.0, "00:00:00"),
            point(500.0, "00:00:01"),
            point(0.0, "00:00:02"),
        ];
        assert_eq!(altitude_delta(&points), 0.0);
    }

    #[test]
    fn test_altitude_delta_too_few_known() {
        assert_eq!(altitude_delta(&[]), 0.0);
        assert_eq!(altitude_delta(&[point(300.0, "00:00:00")]), 0.0);
        assert_eq!(
            altitude_delta(&[point(-777.0, "00:00:00"), point(300.0, "00:00:01")]),
            0.0
        );
    }

    #[test]
    fn test_point_ceiling() {
        assert!(!exceeds_point_ceiling(2500, 2500));
        assert!(exceeds_point_ceiling(2501, 2500));
        assert!(!exceeds_point_ceiling(0, 2500));
    }

    #[test]
    fn test_empty_trajectory_is_parse_error() {
        let result = assemble("000", &[], &LabelIndex::default(), Path::new("a.plt"));
        assert!(matches!(result, Err(GeolifeError::Parse { .. })));
    }

    #[test]
    fn test_bad_time_is_parse_error() {
        let points = vec![
            point(100.0, "02:53:04"),
            RawPoint {
                line: 8,
                ..point(100.0, "25:99:00")
            },
        ];
        let result = assemble("000", &points, &LabelIndex::default(), Path::new("a.plt"));
        assert!(matches!(result, Err(GeolifeError::Parse { line: 8, .. })));
    }

    #[test]
    fn test_bad_time_after_blank_line_reports_file_line() {
        let text = "Geolife trajectory\nWGS 84\nAltitude is in Feet\nReserved 3\n\
                    0,2,255,My Track,0,0,2,8421376\n0\n\
                    39.9,116.4,0,100,39744.5,2008-10-23,02:53:04\n\
                    \n\
                    39.9,116.4,0,100,39744.5,2008-10-23,25:99:00\n";
        let points =
            crate::trajectory::parse_trajectory_reader(Cursor::new(text), Path::new("a.plt"))
                .unwrap();
        let result = assemble("000", &points, &LabelIndex::default(), Path::new("a.plt"));
        assert!(matches!(result, Err(GeolifeError::Parse { line: 9, .. })));
    }
}
