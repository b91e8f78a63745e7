use crate::activity::ActivityRecord;
use crate::analyzers::types::{MonthlyStat, WeeklyCountryStat};
use crate::analyzers::utility::{count_distinct, mean};
use chrono::{Days, NaiveDate, Weekday};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Minimum distance (km, exclusive) for a run to count toward weekly rankings.
pub const QUALIFYING_DISTANCE_KM: f64 = 1.0;

/// Per-group measurement series collected before reducing to means.
#[derive(Default)]
struct GroupSeries<'a> {
    distance: Vec<f64>,
    duration: Vec<f64>,
    speed: Vec<f64>,
    athletes: Vec<&'a str>,
}

impl<'a> GroupSeries<'a> {
    fn push(&mut self, record: &'a ActivityRecord) {
        self.distance.push(record.distance);
        self.duration.push(record.duration);
        self.speed.push(record.speed_per_hour);
        self.athletes.push(&record.athlete);
    }

    fn total_runners(&self) -> usize {
        count_distinct(self.athletes.iter().copied())
    }
}

type MonthlyKey<'a> = (i32, u32, &'a str, &'a str, &'static str, &'a str);

/// Groups cleaned activities by (year, month, gender, age_group, weekday, country).
///
/// Rows without a parsed timestamp are skipped. Output follows ascending key
/// order and only contains groups that have at least one activity.
pub fn monthly_stats(records: &[ActivityRecord]) -> Vec<MonthlyStat> {
    let mut groups: BTreeMap<MonthlyKey, GroupSeries> = BTreeMap::new();
    let mut undated = 0usize;

    for record in records {
        let (Some(year), Some(month), Some(weekday)) = (record.year, record.month, record.weekday)
        else {
            undated += 1;
            continue;
        };

        groups
            .entry((
                year,
                month,
                record.gender.as_str(),
                record.age_group.as_str(),
                weekday,
                record.country.as_str(),
            ))
            .or_default()
            .push(record);
    }

    if undated > 0 {
        warn!(undated, "Skipped activities without a timestamp");
    }

    let stats: Vec<_> = groups
        .into_iter()
        .map(
            |((year, month, gender, age_group, weekday, country), series)| MonthlyStat {
                year,
                month,
                gender: gender.to_string(),
                age_group: age_group.to_string(),
                weekday: weekday.to_string(),
                country: country.to_string(),
                distance: mean(&series.distance),
                duration: mean(&series.duration),
                speed_per_hour: mean(&series.speed),
                total_runners: series.total_runners(),
            },
        )
        .collect();

    debug!(groups = stats.len(), "Monthly stats computed");
    stats
}

/// Groups qualifying activities (distance > 1 km) by (country, year_week),
/// then orders the table chronologically by each week's Monday.
pub fn weekly_country_stats(records: &[ActivityRecord]) -> Vec<WeeklyCountryStat> {
    let mut groups: BTreeMap<(&str, String), GroupSeries> = BTreeMap::new();

    for record in records {
        if record.distance <= QUALIFYING_DISTANCE_KM {
            continue;
        }
        let Some(year_week) = record.year_week() else {
            continue;
        };

        groups
            .entry((record.country.as_str(), year_week))
            .or_default()
            .push(record);
    }

    let mut dated: Vec<_> = groups
        .into_iter()
        .map(|((country, year_week), series)| {
            let anchor = year_week_anchor(&year_week);
            let stat = WeeklyCountryStat {
                country: country.to_string(),
                year_week,
                total_runners: series.total_runners(),
                distance: mean(&series.distance),
                duration: mean(&series.duration),
            };
            (anchor, stat)
        })
        .collect();

    // Stable: rows of the same week keep country order.
    dated.sort_by_key(|(anchor, _)| *anchor);

    debug!(rows = dated.len(), "Weekly country stats computed");
    dated.into_iter().map(|(_, stat)| stat).collect()
}

/// Monday of the given `"{year}-{week}"` period.
///
/// Counted from the Monday of ISO week 1 of `year`, so week 53 resolves even
/// in years that only have 52 ISO weeks.
pub fn year_week_anchor(year_week: &str) -> Option<NaiveDate> {
    let (year, week) = year_week.split_once('-')?;
    let year: i32 = year.trim().parse().ok()?;
    let week: u64 = week.trim().parse().ok()?;
    if week == 0 {
        return None;
    }

    NaiveDate::from_isoywd_opt(year, 1, Weekday::Mon)?.checked_add_days(Days::new((week - 1) * 7))
}
