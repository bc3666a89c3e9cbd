//! `.plt` trajectory file parsing.
//!
//! Each file starts with six header lines, followed by one row per sample:
//!
//! ```text
//! 39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04
//! lat       lon        -  alt days             date       time
//! ```
//!
//! Columns after the time are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{GeolifeError, Result};

/// Number of non-data lines at the top of every trajectory file.
pub const HEADER_LINES: usize = 6;

/// One row of a trajectory file, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Feet; -777 when unknown
    pub altitude: f64,
    pub date_days: f64,
    pub date: String,
    pub time: String,
    /// 1-based line in the source file
    pub line: usize,
}

impl RawPoint {
    /// `date` and `time` joined as `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp_string(&self) -> String {
        format!("{} {}", self.date, self.time)
    }
}

/// Read a trajectory file into its rows, in file order.
pub fn parse_trajectory(path: &Path) -> Result<Vec<RawPoint>> {
    let file = File::open(path).map_err(|e| GeolifeError::file_access(path, e))?;
    parse_trajectory_reader(BufReader::new(file), path)
}

/// Parse trajectory rows from any reader. `source` is only used in errors.
pub fn parse_trajectory_reader<R: BufRead>(mut reader: R, source: &Path) -> Result<Vec<RawPoint>> {
    // The header has a comma-separated track line, so it never reaches the csv reader
    let mut skipped = String::new();
    for _ in 0..HEADER_LINES {
        skipped.clear();
        let read = reader
            .read_line(&mut skipped)
            .map_err(|e| GeolifeError::file_access(source, e))?;
        if read == 0 {
            return Ok(Vec::new());
        }
    }

    let mut rows = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for record in rows.records() {
        let record = record.map_err(|e| csv_error(source, HEADER_LINES, e))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = HEADER_LINES + record.position().map_or(0, |p| p.line() as usize);
        points.push(parse_row(&record, source, line)?);
    }

    Ok(points)
}

/// Convert a csv failure, offsetting its line by the lines read before the csv reader.
pub(crate) fn csv_error(source: &Path, offset: usize, err: csv::Error) -> GeolifeError {
    let line = offset + err.position().map_or(0, |p| p.line() as usize);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => GeolifeError::file_access(source, e),
        _ => GeolifeError::parse(source, line, message),
    }
}

fn parse_row(record: &StringRecord, source: &Path, line: usize) -> Result<RawPoint> {
    if record.len() < 7 {
        return Err(GeolifeError::parse(
            source,
            line,
            format!("expected at least 7 columns, found {}", record.len()),
        ));
    }

    let number = |col: usize, name: &str| -> Result<f64> {
        record[col].parse::<f64>().map_err(|_| {
            GeolifeError::parse(
                source,
                line,
                format!("non-numeric {} in column {}: '{}'", name, col + 1, &record[col]),
            )
        })
    };

    Ok(RawPoint {
        latitude: number(0, "latitude")?,
        longitude: number(1, "longitude")?,
        altitude: number(3, "altitude")?,
        date_days: number(4, "date_days")?,
        date: record[5].to_string(),
        time: record[6].to_string(),
        line,
    })
}
