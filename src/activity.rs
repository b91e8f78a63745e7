//! Activity enrichment and cleaning.
//!
//! Turns [`RawActivity`] rows into [`ActivityRecord`]s with calendar fields
//! and speed, then removes outliers and non-positive measurements.

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::Serialize;
use tracing::info;

use crate::parser::{RawActivity, parse_timestamp};

/// Runs at or beyond this distance (km) are treated as outliers.
pub const MAX_DISTANCE_KM: f64 = 150.0;
/// Runs at or beyond this duration (minutes) are treated as outliers.
pub const MAX_DURATION_MIN: f64 = 1200.0;
/// Runs at or beyond this speed (km/h) are treated as outliers.
pub const MAX_SPEED_KMH: f64 = 50.0;

/// One enriched activity.
///
/// Calendar fields are `None` when the raw timestamp could not be parsed.
/// Missing numbers are carried as `NaN` so that no comparison admits them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub athlete: String,
    pub timestamp: Option<NaiveDateTime>,
    pub distance: f64,
    pub duration: f64,
    pub gender: String,
    pub age_group: String,
    pub country: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub week: Option<u32>,
    pub weekday: Option<&'static str>,
    pub speed_per_hour: f64,
}

impl ActivityRecord {
    pub fn from_raw(raw: RawActivity) -> Self {
        let timestamp = parse_timestamp(&raw.datetime);
        let distance = raw.distance.unwrap_or(f64::NAN);
        let duration = raw.duration.unwrap_or(f64::NAN);

        ActivityRecord {
            athlete: raw.athlete,
            timestamp,
            distance,
            duration,
            gender: raw.gender,
            age_group: raw.age_group,
            country: raw.country,
            year: timestamp.map(|t| t.year()),
            month: timestamp.map(|t| t.month()),
            week: timestamp.map(|t| t.iso_week().week()),
            weekday: timestamp.map(|t| weekday_name(t.weekday())),
            // Evaluated eagerly; zero durations give inf/NaN which `is_outlier`
            // or `has_positive_measures` always rejects.
            speed_per_hour: distance / duration * 60.0,
        }
    }

    /// True for implausible runs: too long, too far or too fast.
    pub fn is_outlier(&self) -> bool {
        self.distance >= MAX_DISTANCE_KM
            || self.duration >= MAX_DURATION_MIN
            || self.speed_per_hour >= MAX_SPEED_KMH
    }

    pub fn has_positive_measures(&self) -> bool {
        self.distance > 0.0 && self.duration > 0.0
    }

    /// `"{year}-{iso week}"`, or `None` without a usable timestamp.
    pub fn year_week(&self) -> Option<String> {
        match (self.year, self.week) {
            (Some(year), Some(week)) => Some(format_year_week(year, week)),
            _ => None,
        }
    }
}

pub fn format_year_week(year: i32, week: u32) -> String {
    format!("{}-{}", year, week)
}

/// English day name, independent of locale.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Numeric columns of an [`ActivityRecord`] usable as histogram axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Distance,
    Duration,
    SpeedPerHour,
}

impl Measure {
    pub fn column(&self) -> &'static str {
        match self {
            Measure::Distance => "distance",
            Measure::Duration => "duration",
            Measure::SpeedPerHour => "speed_per_hour",
        }
    }

    pub fn value(&self, record: &ActivityRecord) -> f64 {
        match self {
            Measure::Distance => record.distance,
            Measure::Duration => record.duration,
            Measure::SpeedPerHour => record.speed_per_hour,
        }
    }
}

/// Drops outliers first, then rows without a positive distance and duration.
pub fn clean(records: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
    let input = records.len();

    let plausible: Vec<_> = records.into_iter().filter(|r| !r.is_outlier()).collect();
    let outliers = input - plausible.len();

    let cleaned: Vec<_> = plausible
        .into_iter()
        .filter(ActivityRecord::has_positive_measures)
        .collect();
    let non_positive = input - outliers - cleaned.len();

    info!(
        input,
        outliers,
        non_positive,
        kept = cleaned.len(),
        "Activities cleaned"
    );

    cleaned
}

/// Enriches every raw row and cleans the result.
pub fn prepare(raw: Vec<RawActivity>) -> Vec<ActivityRecord> {
    let enriched: Vec<_> = raw.into_iter().map(ActivityRecord::from_raw).collect();
    clean(enriched)
}
