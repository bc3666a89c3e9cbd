//! # Data Loader
//!
//! Walks a GeoLife dataset directory and writes users, activities and
//! trackpoints into a [`Store`].
//!
//! ```text
//! <data_dir>/
//!   labeled_ids.txt          one user id per line
//!   Data/
//!     000/
//!       Trajectory/*.plt
//!     010/
//!       labels.txt           optional
//!       Trajectory/*.plt
//! ```
//!
//! Loading is a one-shot batch: the first unreadable or malformed file aborts
//! the run, and loading the same directory twice stores everything twice.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::{
    assemble, exceeds_point_ceiling, parse_trajectory, GeolifeError, LabelIndex, LoaderConfig,
    Result, Store, User,
};

/// File listing the ids of users that have a `labels.txt`.
pub const LABELED_IDS_FILE: &str = "labeled_ids.txt";

/// Directory holding one subdirectory per user.
pub const USERS_DIR: &str = "Data";

/// Per-user directory holding the `.plt` files.
pub const TRAJECTORY_DIR: &str = "Trajectory";

/// Totals for one loader run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub users: usize,
    pub activities: usize,
    pub trackpoints: usize,
    /// Trajectories over the point ceiling
    pub skipped_activities: usize,
}

/// Loads a dataset directory into a borrowed store.
pub struct DataLoader<'a> {
    store: &'a mut Store,
    config: LoaderConfig,
}

impl<'a> DataLoader<'a> {
    pub fn new(store: &'a mut Store, config: LoaderConfig) -> Self {
        Self { store, config }
    }

    /// Full load: optionally drop existing data, then users, then activities.
    pub fn run(&mut self, drop_first: bool) -> Result<IngestStats> {
        if drop_first {
            self.drop_collections()?;
        }
        let users = self.load_users()?;
        let mut stats = self.load_activities()?;
        stats.users = users;
        info!(
            "All records inserted: {} users, {} activities, {} trackpoints ({} activities skipped)",
            stats.users, stats.activities, stats.trackpoints, stats.skipped_activities
        );
        Ok(stats)
    }

    /// Insert one user per directory under `Data/`.
    pub fn load_users(&mut self) -> Result<usize> {
        let labeled = read_labeled_ids(&self.config.data_dir.join(LABELED_IDS_FILE))?;

        let users: Vec<User> = user_dirs(&self.config.data_dir.join(USERS_DIR))?
            .into_iter()
            .map(|(id, _)| User {
                has_labels: labeled.contains(&id),
                id,
            })
            .collect();

        let inserted = self.store.insert_users(&users)?;
        info!("{} records inserted into users", inserted);
        Ok(inserted)
    }

    /// Insert every trajectory under the point ceiling, with its trackpoints.
    ///
    /// The returned stats leave `users` at zero.
    pub fn load_activities(&mut self) -> Result<IngestStats> {
        let mut stats = IngestStats::default();

        for (user_id, user_dir) in user_dirs(&self.config.data_dir.join(USERS_DIR))? {
            let labels = LabelIndex::load(&user_dir)?;

            for path in trajectory_files(&user_dir.join(TRAJECTORY_DIR))? {
                let points = parse_trajectory(&path)?;

                if exceeds_point_ceiling(points.len(), self.config.max_trackpoints_per_activity) {
                    debug!(
                        "Skipping {} ({} points > {})",
                        path.display(),
                        points.len(),
                        self.config.max_trackpoints_per_activity
                    );
                    stats.skipped_activities += 1;
                    continue;
                }

                let assembled = assemble(&user_id, &points, &labels, &path)?;
                let activity_id = self.store.insert_activity(&assembled.activity)?;
                let inserted = self
                    .store
                    .insert_trackpoints(activity_id, &assembled.trackpoints)?;

                stats.activities += 1;
                stats.trackpoints += inserted;
                info!(
                    "{} trackpoints inserted for activity {}",
                    inserted,
                    file_name(&path)
                );
            }

            info!("Activities and trackpoints inserted for user {}", user_id);
        }

        Ok(stats)
    }

    /// Remove all users, activities and trackpoints.
    pub fn drop_collections(&mut self) -> Result<()> {
        self.store.clear()?;
        info!("All collections have been dropped");
        Ok(())
    }
}

fn read_labeled_ids(path: &Path) -> Result<HashSet<String>> {
    let text = fs::read_to_string(path).map_err(|e| GeolifeError::file_access(path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// `(user_id, path)` for each subdirectory, sorted by id.
fn user_dirs(data_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut dirs: Vec<(String, PathBuf)> = list_dir(data_dir)?
        .into_iter()
        .filter(|path| path.is_dir())
        .map(|path| (file_name(&path), path))
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Regular files in a trajectory directory, sorted by name.
fn trajectory_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = list_dir(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::read_dir(dir)
        .map_err(|e| GeolifeError::file_access(dir, e))?
        .map(|entry| {
            entry
                .map(|e| e.path())
                .map_err(|e| GeolifeError::file_access(dir, e))
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_labeled_ids_trims_and_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LABELED_IDS_FILE);
        fs::write(&path, "010\n 020 \n\n").unwrap();

        let ids = read_labeled_ids(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("010"));
        assert!(ids.contains("020"));
    }

    #[test]
    fn test_user_dirs_sorted_and_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("010")).unwrap();
        fs::create_dir(dir.path().join("000")).unwrap();
        fs::write(dir.path().join("README"), "not a user").unwrap();

        let ids: Vec<String> = user_dirs(dir.path())
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["000".to_string(), "010".to_string()]);
    }

    #[test]
    fn test_missing_data_dir_is_file_access_error() {
        let mut store = Store::in_memory().unwrap();
        let config = LoaderConfig {
            data_dir: PathBuf::from("/nonexistent/dataset"),
            max_trackpoints_per_activity: 2500,
        };
        let result = DataLoader::new(&mut store, config).run(false);
        assert!(matches!(result, Err(GeolifeError::FileAccess { .. })));
    }
}
