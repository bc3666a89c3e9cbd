//! Unified error handling for the geolife library.
//!
//! Every failure in the loader and the query layer is fatal for the run, so
//! the variants only need to carry enough context to print a useful message.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for geolife operations.
#[derive(Debug, Error)]
pub enum GeolifeError {
    /// Input file or directory is missing or unreadable
    #[error("Cannot access '{}': {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed row in a trajectory or label file
    #[error("Parse error in '{}' at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// SQLite read or write failure
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Schema migration failure
    #[error("Schema migration failed: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    /// Invalid configuration file or value
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl GeolifeError {
    /// Build a `FileAccess` error for `path`.
    pub fn file_access(path: impl AsRef<Path>, source: io::Error) -> Self {
        GeolifeError::FileAccess {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a `Parse` error for `path` at a 1-based `line`.
    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        GeolifeError::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for geolife operations.
pub type Result<T> = std::result::Result<T, GeolifeError>;

/// Extension trait for converting Option to GeolifeError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error at the given location.
    fn ok_or_parse(self, path: &Path, line: usize, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, path: &Path, line: usize, message: &str) -> Result<T> {
        self.ok_or_else(|| GeolifeError::parse(path, line, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeolifeError::parse("Data/000/Trajectory/a.plt", 9, "bad latitude");
        let text = err.to_string();
        assert!(text.contains("a.plt"));
        assert!(text.contains("line 9"));
        assert!(text.contains("bad latitude"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<&str> = None;
        let result = none.ok_or_parse(Path::new("labels.txt"), 3, "missing mode");
        assert!(matches!(result, Err(GeolifeError::Parse { line: 3, .. })));
    }

    #[test]
    fn test_storage_conversion() {
        let err: GeolifeError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(err.to_string().starts_with("Storage error"));
    }
}
