use log::info;
use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::Result;

/// Initial schema: users, activities and their ordered trackpoints.
///
/// Trackpoint ids increase in insertion order, which is file order, so
/// `ORDER BY id` reproduces the recorded sequence.
const SCHEMA_V1: &str = r#"
    CREATE TABLE users (
        id TEXT NOT NULL,
        has_labels INTEGER NOT NULL
    );

    CREATE TABLE activities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        transportation_mode TEXT,
        start_date_time TEXT NOT NULL,
        end_date_time TEXT NOT NULL,
        altitude_diff REAL
    );

    CREATE TABLE trackpoints (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        activity_id INTEGER NOT NULL,
        lat REAL NOT NULL,
        lon REAL NOT NULL,
        altitude REAL NOT NULL,
        date_days REAL NOT NULL,
        date_time TEXT NOT NULL,
        FOREIGN KEY (activity_id) REFERENCES activities(id) ON DELETE CASCADE
    );

    CREATE INDEX idx_activities_user ON activities(user_id);
    CREATE INDEX idx_activities_mode ON activities(transportation_mode);
    CREATE INDEX idx_trackpoints_activity ON trackpoints(activity_id);
"#;

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(SCHEMA_V1)])
}

/// Bring the schema to the latest version.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    info!("Running schema migrations");
    migrations().to_latest(conn)?;
    Ok(())
}
