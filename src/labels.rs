//! Transportation-mode labels for one user.
//!
//! GeoLife ships a `labels.txt` next to `Trajectory/` for users who annotated
//! their trips:
//!
//! ```text
//! Start Time	End Time	Transportation Mode
//! 2008/04/02 11:24:21	2008/04/02 11:50:45	bus
//! ```
//!
//! Dates use `/` separators while trajectory files use `-`, so keys are
//! normalized before they are stored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use log::debug;

use crate::trajectory::csv_error;
use crate::{GeolifeError, OptionExt, Result};

/// File name of the per-user label file.
pub const LABELS_FILE: &str = "labels.txt";

/// Exact (start, end) timestamp pair → transportation mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelIndex {
    labels: HashMap<(String, String), String>,
}

impl LabelIndex {
    /// Build the index for a user directory.
    ///
    /// A user without a `labels.txt` gets an empty index.
    pub fn load(user_dir: &Path) -> Result<Self> {
        let path = user_dir.join(LABELS_FILE);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(GeolifeError::file_access(&path, e)),
        };

        let index = Self::from_reader(file, &path)?;
        debug!("Loaded {} labels from {}", index.len(), path.display());
        Ok(index)
    }

    /// Parse label rows from any reader. `source` is only used in errors.
    ///
    /// The first row is a header and is never looked at.
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self> {
        let mut rows = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut labels = HashMap::new();
        for record in rows.records() {
            let record = record.map_err(|e| csv_error(source, 0, e))?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line() as usize);

            let start = record.get(0).ok_or_parse(source, line, "missing start time")?;
            let end = record.get(1).ok_or_parse(source, line, "missing end time")?;
            let mode = record
                .get(2)
                .ok_or_parse(source, line, "missing transportation mode")?;

            labels.insert(
                (normalize_timestamp(start), normalize_timestamp(end)),
                mode.to_string(),
            );
        }

        Ok(Self { labels })
    }

    /// Mode recorded for exactly this (start, end) pair.
    pub fn lookup(&self, start: &str, end: &str) -> Option<&str> {
        self.labels
            .get(&(start.to_string(), end.to_string()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Convert `2008/04/02 11:24:21` to `2008-04-02 11:24:21`.
pub fn normalize_timestamp(raw: &str) -> String {
    raw.trim().replace('/', "-")
}
