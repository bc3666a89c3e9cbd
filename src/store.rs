//! # Store
//!
//! SQLite storage session for users, activities and trackpoints.
//!
//! A [`Store`] owns its connection. Open one at the call boundary, pass it by
//! reference to the loader or the queries, and let it drop to release the
//! database.
//!
//! Bulk inserts run in one transaction per call. Nothing spans collections:
//! an activity row is committed before its trackpoints are written.

use std::path::Path;

use chrono::NaiveDateTime;
use log::debug;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult, Row};

use crate::{
    migrations, Activity, Bounds, NewActivity, NewTrackpoint, Result, Trackpoint, User,
    TIMESTAMP_FORMAT,
};

const ACTIVITY_COLUMNS: &str =
    "id, user_id, transportation_mode, start_date_time, end_date_time, altitude_diff";

const TRACKPOINT_COLUMNS: &str = "id, activity_id, lat, lon, altitude, date_days, date_time";

/// SQLite-backed storage session.
pub struct Store {
    db: Connection,
}

impl Store {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) the database at `path` and migrate its schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening database {}", path.display());
        Self::init(Connection::open(path)?)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut db: Connection) -> Result<Self> {
        db.pragma_update(None, "foreign_keys", "ON")?;
        migrations::migrate(&mut db)?;
        Ok(Self { db })
    }

    // ========================================================================
    // Inserts
    // ========================================================================

    /// Insert users in a single transaction.
    pub fn insert_users(&mut self, users: &[User]) -> Result<usize> {
        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO users (id, has_labels) VALUES (?, ?)")?;
            for user in users {
                stmt.execute(params![user.id, user.has_labels])?;
            }
        }
        tx.commit()?;
        Ok(users.len())
    }

    /// Insert one activity and return its id.
    pub fn insert_activity(&self, activity: &NewActivity) -> Result<i64> {
        self.db.execute(
            "INSERT INTO activities (user_id, transportation_mode, start_date_time, end_date_time, altitude_diff)
             VALUES (?, ?, ?, ?, ?)",
            params![
                activity.user_id,
                activity.transportation_mode,
                format_timestamp(&activity.start_date_time),
                format_timestamp(&activity.end_date_time),
                activity.altitude_diff,
            ],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    /// Insert the trackpoints of one activity in a single transaction.
    ///
    /// Slice order becomes id order.
    pub fn insert_trackpoints(
        &mut self,
        activity_id: i64,
        trackpoints: &[NewTrackpoint],
    ) -> Result<usize> {
        let tx = self.db.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO trackpoints (activity_id, lat, lon, altitude, date_days, date_time)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;
            for tp in trackpoints {
                stmt.execute(params![
                    activity_id,
                    tp.lat,
                    tp.lon,
                    tp.altitude,
                    tp.date_days,
                    format_timestamp(&tp.date_time),
                ])?;
            }
        }
        tx.commit()?;
        Ok(trackpoints.len())
    }

    /// Delete all rows from all three collections.
    pub fn clear(&mut self) -> Result<()> {
        self.db.execute_batch(
            "DELETE FROM trackpoints;
             DELETE FROM activities;
             DELETE FROM users;",
        )?;
        Ok(())
    }

    // ========================================================================
    // Counts
    // ========================================================================

    pub fn count_users(&self) -> Result<u64> {
        self.count("users")
    }

    pub fn count_activities(&self) -> Result<u64> {
        self.count("activities")
    }

    pub fn count_trackpoints(&self) -> Result<u64> {
        self.count("trackpoints")
    }

    fn count(&self, table: &str) -> Result<u64> {
        let n: i64 = self
            .db
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        Ok(n as u64)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn load_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, has_labels FROM users ORDER BY rowid")?;
        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    has_labels: row.get(1)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(users)
    }

    /// All activities in insertion order.
    pub fn load_activities(&self) -> Result<Vec<Activity>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM activities ORDER BY id",
            ACTIVITY_COLUMNS
        ))?;
        let activities = stmt
            .query_map([], activity_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(activities)
    }

    /// Trackpoints of one activity, in recorded order.
    pub fn load_trackpoints(&self, activity_id: i64) -> Result<Vec<Trackpoint>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM trackpoints WHERE activity_id = ? ORDER BY id",
            TRACKPOINT_COLUMNS
        ))?;
        let trackpoints = stmt
            .query_map(params![activity_id], trackpoint_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(trackpoints)
    }

    /// Every trackpoint, grouped by activity and in recorded order within each.
    pub fn load_all_trackpoints(&self) -> Result<Vec<Trackpoint>> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {} FROM trackpoints ORDER BY activity_id, id",
            TRACKPOINT_COLUMNS
        ))?;
        let trackpoints = stmt
            .query_map([], trackpoint_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(trackpoints)
    }

    /// Distinct users owning at least one trackpoint inside `bounds`.
    pub fn users_with_points_in(&self, bounds: &Bounds) -> Result<Vec<String>> {
        let mut stmt = self.db.prepare(
            "SELECT DISTINCT a.user_id
             FROM trackpoints t
             JOIN activities a ON a.id = t.activity_id
             WHERE t.lat >= ? AND t.lat < ? AND t.lon >= ? AND t.lon < ?
             ORDER BY a.user_id",
        )?;
        let users = stmt
            .query_map(
                params![bounds.min_lat, bounds.max_lat, bounds.min_lng, bounds.max_lng],
                |row| row.get(0),
            )?
            .collect::<SqlResult<Vec<String>>>()?;
        Ok(users)
    }

    // ========================================================================
    // Samples
    // ========================================================================

    pub fn first_user(&self) -> Result<Option<User>> {
        let user = self
            .db
            .query_row(
                "SELECT id, has_labels FROM users ORDER BY rowid LIMIT 1",
                [],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        has_labels: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// First activity that carries a transportation mode.
    pub fn first_labeled_activity(&self) -> Result<Option<Activity>> {
        let activity = self
            .db
            .query_row(
                &format!(
                    "SELECT {} FROM activities WHERE transportation_mode IS NOT NULL ORDER BY id LIMIT 1",
                    ACTIVITY_COLUMNS
                ),
                [],
                activity_from_row,
            )
            .optional()?;
        Ok(activity)
    }

    pub fn first_trackpoint(&self, activity_id: i64) -> Result<Option<Trackpoint>> {
        let trackpoint = self
            .db
            .query_row(
                &format!(
                    "SELECT {} FROM trackpoints WHERE activity_id = ? ORDER BY id LIMIT 1",
                    TRACKPOINT_COLUMNS
                ),
                params![activity_id],
                trackpoint_from_row,
            )
            .optional()?;
        Ok(trackpoint)
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn activity_from_row(row: &Row<'_>) -> SqlResult<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        user_id: row.get(1)?,
        transportation_mode: row.get(2)?,
        start_date_time: timestamp_column(row, 3)?,
        end_date_time: timestamp_column(row, 4)?,
        altitude_diff: row.get(5)?,
    })
}

fn trackpoint_from_row(row: &Row<'_>) -> SqlResult<Trackpoint> {
    Ok(Trackpoint {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        lat: row.get(2)?,
        lon: row.get(3)?,
        altitude: row.get(4)?,
        date_days: row.get(5)?,
        date_time: timestamp_column(row, 6)?,
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> SqlResult<NaiveDateTime> {
    let text: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ============================================================================
// Tests
// ============================================================================
