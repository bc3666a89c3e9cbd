//! # Derived-Metric Queries
//!
//! Batch reports over stored users, activities and trackpoints.
//!
//! Each report is a pure fold over in-memory records (the free functions in
//! this module) plus a thin [`Queries`] method that loads the records from a
//! [`Store`] and renders a [`Report`]. The numbering matches the CLI:
//!
//! | # | Report |
//! |---|--------|
//! | 1 | Rows per collection |
//! | 2 | Average activities per user |
//! | 3 | Top users by activity count |
//! | 4 | Users who used a given mode |
//! | 5 | Activities per transportation mode |
//! | 6 | Year with most activities vs. year with most hours |
//! | 7 | Distance covered by one user, mode and year |
//! | 8 | Top users by altitude gain |
//! | 9 | Activities with temporal gaps, per user |
//! | 10 | Users with trackpoints inside the geofence |
//! | 11 | Most used mode per user |
//! | 13 | One sample record of each kind |

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;

use crate::{geo_utils, Activity, QueryConfig, Report, Result, Store, Trackpoint};

/// Altitudes are recorded in feet.
pub const FEET_TO_METERS: f64 = 0.3048;

// ============================================================================
// Folds
// ============================================================================

/// Activity count per user, highest first (ties by user id).
pub fn activities_per_user(activities: &[Activity]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for activity in activities {
        *counts.entry(activity.user_id.as_str()).or_insert(0) += 1;
    }
    sorted_desc(
        counts
            .into_iter()
            .map(|(user, count)| (user.to_string(), count))
            .collect(),
    )
}

/// Mean activity count over users that have at least one activity.
pub fn average_activities_per_user(activities: &[Activity]) -> Option<f64> {
    let per_user = activities_per_user(activities);
    if per_user.is_empty() {
        return None;
    }
    let total: usize = per_user.iter().map(|(_, count)| count).sum();
    Some(total as f64 / per_user.len() as f64)
}

/// Distinct users with at least one activity in `mode`, sorted.
pub fn users_with_mode(activities: &[Activity], mode: &str) -> Vec<String> {
    let users: HashSet<&str> = activities
        .iter()
        .filter(|a| a.transportation_mode.as_deref() == Some(mode))
        .map(|a| a.user_id.as_str())
        .collect();
    let mut users: Vec<String> = users.into_iter().map(str::to_string).collect();
    users.sort();
    users
}

/// Activity count per labeled mode, highest first.
pub fn mode_distribution(activities: &[Activity]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for mode in activities
        .iter()
        .filter_map(|a| a.transportation_mode.as_deref())
    {
        *counts.entry(mode).or_insert(0) += 1;
    }
    sorted_desc(
        counts
            .into_iter()
            .map(|(mode, count)| (mode.to_string(), count))
            .collect(),
    )
}

/// Busiest year by activity count and by recorded hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyExtremes {
    pub most_activities_year: i32,
    pub most_activities: usize,
    pub most_hours_year: i32,
    pub most_hours: f64,
}

impl YearlyExtremes {
    pub fn same_year(&self) -> bool {
        self.most_activities_year == self.most_hours_year
    }
}

/// Group activities by start year; `None` when there are no activities.
///
/// An activity spanning New Year counts entirely toward its start year.
/// Equal maxima resolve to the earliest year.
pub fn yearly_extremes(activities: &[Activity]) -> Option<YearlyExtremes> {
    let mut per_year: BTreeMap<i32, (usize, f64)> = BTreeMap::new();
    for activity in activities {
        let entry = per_year.entry(activity.start_year()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += activity.duration_hours();
    }

    let mut years = per_year.into_iter();
    let (first_year, (first_count, first_hours)) = years.next()?;
    let mut extremes = YearlyExtremes {
        most_activities_year: first_year,
        most_activities: first_count,
        most_hours_year: first_year,
        most_hours: first_hours,
    };

    for (year, (count, hours)) in years {
        if count > extremes.most_activities {
            extremes.most_activities_year = year;
            extremes.most_activities = count;
        }
        if hours > extremes.most_hours {
            extremes.most_hours_year = year;
            extremes.most_hours = hours;
        }
    }

    Some(extremes)
}

/// Selects activities for the distance report.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceFilter {
    pub user_id: String,
    pub mode: String,
    pub year: i32,
}

impl DistanceFilter {
    /// Owner and mode match, and both endpoints fall in the calendar year.
    pub fn matches(&self, activity: &Activity) -> bool {
        activity.user_id == self.user_id
            && activity.transportation_mode.as_deref() == Some(self.mode.as_str())
            && self.in_year(&activity.start_date_time)
            && self.in_year(&activity.end_date_time)
    }

    fn in_year(&self, ts: &NaiveDateTime) -> bool {
        let next_year = self.year.checked_add(1).and_then(year_start);
        let (Some(from), Some(until)) = (year_start(self.year), next_year) else {
            return false;
        };
        *ts >= from && *ts < until
    }
}

fn year_start(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Haversine length of an activity's trackpoint sequence, in kilometers.
pub fn activity_distance_km(trackpoints: &[Trackpoint]) -> f64 {
    let points: Vec<_> = trackpoints.iter().map(Trackpoint::point).collect();
    geo_utils::polyline_length(&points) / 1000.0
}

/// Summed altitude delta per user in meters, highest first.
///
/// Activities without a delta contribute nothing.
pub fn altitude_gain_per_user(activities: &[Activity]) -> Vec<(String, f64)> {
    let mut gains: HashMap<&str, f64> = HashMap::new();
    for activity in activities {
        *gains.entry(activity.user_id.as_str()).or_insert(0.0) +=
            activity.altitude_diff.unwrap_or(0.0) * FEET_TO_METERS;
    }
    let mut gains: Vec<(String, f64)> = gains
        .into_iter()
        .map(|(user, gain)| (user.to_string(), gain))
        .collect();
    gains.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    gains
}

/// True when two time-consecutive trackpoints are more than `threshold` apart.
pub fn has_temporal_gap<'a>(
    trackpoints: impl IntoIterator<Item = &'a Trackpoint>,
    threshold: Duration,
) -> bool {
    let mut times: Vec<NaiveDateTime> = trackpoints.into_iter().map(|tp| tp.date_time).collect();
    times.sort();
    times.windows(2).any(|w| w[1] - w[0] > threshold)
}

/// Number of activities with at least one temporal gap, per user, sorted by user.
///
/// Users without such activities are left out.
pub fn invalid_activities_per_user(
    activities: &[Activity],
    trackpoints: &[Trackpoint],
    threshold: Duration,
) -> Vec<(String, usize)> {
    let mut by_activity: HashMap<i64, Vec<&Trackpoint>> = HashMap::new();
    for tp in trackpoints {
        by_activity.entry(tp.activity_id).or_default().push(tp);
    }

    let mut per_user: BTreeMap<&str, usize> = BTreeMap::new();
    for activity in activities {
        let Some(points) = by_activity.get(&activity.id) else {
            continue;
        };
        if has_temporal_gap(points.iter().copied(), threshold) {
            *per_user.entry(activity.user_id.as_str()).or_insert(0) += 1;
        }
    }

    per_user
        .into_iter()
        .map(|(user, count)| (user.to_string(), count))
        .collect()
}

/// A user's most used transportation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominantMode {
    pub user_id: String,
    pub mode: String,
    pub count: usize,
}

/// Most used mode per user, over labeled activities, sorted by user.
///
/// When two modes share the highest count the choice is unspecified; callers
/// must not rely on which one is returned.
pub fn dominant_mode_per_user(activities: &[Activity]) -> Vec<DominantMode> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for activity in activities {
        if let Some(mode) = activity.transportation_mode.as_deref() {
            *counts.entry((activity.user_id.as_str(), mode)).or_insert(0) += 1;
        }
    }

    let mut best: BTreeMap<&str, (&str, usize)> = BTreeMap::new();
    for ((user, mode), count) in counts {
        let entry = best.entry(user).or_insert((mode, count));
        if count >= entry.1 {
            *entry = (mode, count);
        }
    }

    best.into_iter()
        .map(|(user, (mode, count))| DominantMode {
            user_id: user.to_string(),
            mode: mode.to_string(),
            count,
        })
        .collect()
}

fn sorted_desc(mut counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

// ============================================================================
// Query runner
// ============================================================================

/// Runs numbered reports against a borrowed store.
pub struct Queries<'a> {
    store: &'a Store,
    config: QueryConfig,
}

impl<'a> Queries<'a> {
    pub fn new(store: &'a Store, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// Run report `number`. Unknown numbers yield `None`.
    pub fn run(&self, number: i64) -> Result<Option<Report>> {
        debug!("Running query {}", number);
        let report = match number {
            1 => self.collection_counts()?,
            2 => self.average_activities()?,
            3 => self.top_users()?,
            4 => self.users_with_mode()?,
            5 => self.mode_distribution()?,
            6 => self.yearly_extremes()?,
            7 => self.distance_traveled()?,
            8 => self.altitude_gain()?,
            9 => self.invalid_activities()?,
            10 => self.geofence_users()?,
            11 => self.dominant_modes()?,
            13 => self.sample_records()?,
            _ => return Ok(None),
        };
        Ok(Some(report))
    }

    pub fn collection_counts(&self) -> Result<Report> {
        let mut report = Report::table(["Collection", "Count"]);
        report.push_row(["Users".to_string(), self.store.count_users()?.to_string()]);
        report.push_row([
            "Activities".to_string(),
            self.store.count_activities()?.to_string(),
        ]);
        report.push_row([
            "Trackpoints".to_string(),
            self.store.count_trackpoints()?.to_string(),
        ]);
        Ok(report)
    }

    pub fn average_activities(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let line = match average_activities_per_user(&activities) {
            Some(avg) => format!("Average number of activities per user: {:.2}", avg),
            None => "No activities stored".to_string(),
        };
        Ok(Report::text([line]))
    }

    pub fn top_users(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let mut report = Report::table(["User", "Number of activities"])
            .with_title(format!("Top {} users by number of activities", self.config.top_n));
        for (user, count) in activities_per_user(&activities)
            .into_iter()
            .take(self.config.top_n)
        {
            report.push_row([user, count.to_string()]);
        }
        Ok(report)
    }

    pub fn users_with_mode(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let mut report = Report::table([format!(
            "All users who have taken a {}",
            self.config.filter_mode
        )]);
        for user in users_with_mode(&activities, &self.config.filter_mode) {
            report.push_row([user]);
        }
        Ok(report)
    }

    pub fn mode_distribution(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let mut report = Report::table(["Transportation mode", "Number of activities"]);
        for (mode, count) in mode_distribution(&activities) {
            report.push_row([mode, count.to_string()]);
        }
        Ok(report)
    }

    pub fn yearly_extremes(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let Some(extremes) = yearly_extremes(&activities) else {
            return Ok(Report::text(["No activities stored"]));
        };
        Ok(Report::text([
            format!(
                "Year with most activities: {} ({})",
                extremes.most_activities_year, extremes.most_activities
            ),
            format!(
                "Year with most hours: {} ({:.2})",
                extremes.most_hours_year, extremes.most_hours
            ),
            format!(
                "Is the year with most activities the same as the year with most hours? {}",
                extremes.same_year()
            ),
        ]))
    }

    pub fn distance_traveled(&self) -> Result<Report> {
        let filter = DistanceFilter {
            user_id: self.config.distance_user.clone(),
            mode: self.config.distance_mode.clone(),
            year: self.config.distance_year,
        };

        let mut total_km = 0.0;
        for activity in self.store.load_activities()? {
            if filter.matches(&activity) {
                total_km += activity_distance_km(&self.store.load_trackpoints(activity.id)?);
            }
        }

        Ok(Report::text([format!(
            "Total distance ({}) by user {} in {}: {} km",
            filter.mode, filter.user_id, filter.year, total_km
        )]))
    }

    pub fn altitude_gain(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let mut report = Report::table(["User", "Altitude gain"]).with_title(format!(
            "Top {} users who have gained the most altitude",
            self.config.top_n
        ));
        for (user, gain) in altitude_gain_per_user(&activities)
            .into_iter()
            .take(self.config.top_n)
        {
            report.push_row([user, format!("{:.4}", gain)]);
        }
        Ok(report)
    }

    pub fn invalid_activities(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let trackpoints = self.store.load_all_trackpoints()?;
        let threshold = Duration::minutes(self.config.gap_threshold_minutes);

        let mut report = Report::table(["UserId", "InvalidActivities"]);
        for (user, count) in invalid_activities_per_user(&activities, &trackpoints, threshold) {
            report.push_row([user, count.to_string()]);
        }
        Ok(report)
    }

    pub fn geofence_users(&self) -> Result<Report> {
        let mut report = Report::table(["Users"]);
        for user in self.store.users_with_points_in(&self.config.geofence)? {
            report.push_row([user]);
        }
        Ok(report)
    }

    pub fn dominant_modes(&self) -> Result<Report> {
        let activities = self.store.load_activities()?;
        let mut report = Report::table(["User", "Mode", "Count"])
            .with_title("Users who have registered transportation_mode and their most used transportation_mode");
        for dominant in dominant_mode_per_user(&activities) {
            report.push_row([dominant.user_id, dominant.mode, dominant.count.to_string()]);
        }
        Ok(report)
    }

    pub fn sample_records(&self) -> Result<Report> {
        let mut lines = Vec::new();

        lines.push("Instance of User:".to_string());
        lines.push(format!("{:#?}", self.store.first_user()?));

        let activity = self.store.first_labeled_activity()?;
        lines.push("Instance of Activity:".to_string());
        lines.push(format!("{:#?}", activity));

        let trackpoint = match &activity {
            Some(activity) => self.store.first_trackpoint(activity.id)?,
            None => None,
        };
        lines.push("Instance of Trackpoint:".to_string());
        lines.push(format!("{:#?}", trackpoint));

        Ok(Report::text(lines))
    }
}
