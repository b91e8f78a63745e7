//! Dashboard views derived from the persisted tables.
//!
//! These are thin reductions over [`MonthlyStat`] and [`WeeklyCountryStat`]
//! rows; the presentation layer renders them as-is.

use chrono::Weekday;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::activity::weekday_name;
use crate::analyzers::types::{CountryRanking, MonthlyStat, WeeklyCountryStat};
use crate::analyzers::utility::mean;

/// Size of the per-country speed board.
pub const SPEED_BOARD_SIZE: usize = 10;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Headline metric cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Overview {
    pub total_runners: usize,
    pub speed_per_hour: f64,
    pub distance: f64,
    pub duration: f64,
}

/// Sum of runners and plain row means of the measures. Empty input gives zeros.
pub fn overview(stats: &[MonthlyStat]) -> Overview {
    let speeds: Vec<f64> = stats.iter().map(|s| s.speed_per_hour).collect();
    let distances: Vec<f64> = stats.iter().map(|s| s.distance).collect();
    let durations: Vec<f64> = stats.iter().map(|s| s.duration).collect();

    Overview {
        total_runners: stats.iter().map(|s| s.total_runners).sum(),
        speed_per_hour: mean(&speeds),
        distance: mean(&distances),
        duration: mean(&durations),
    }
}

/// Gender / age-group selection. `None` selects every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicFilter {
    pub gender: Option<String>,
    pub age_group: Option<String>,
}

impl DemographicFilter {
    pub fn matches(&self, stat: &MonthlyStat) -> bool {
        self.gender.as_ref().is_none_or(|g| *g == stat.gender)
            && self.age_group.as_ref().is_none_or(|a| *a == stat.age_group)
    }

    pub fn apply(&self, stats: &[MonthlyStat]) -> Vec<MonthlyStat> {
        stats.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}

pub fn gender_options(stats: &[MonthlyStat]) -> Vec<String> {
    distinct_sorted(stats.iter().map(|s| s.gender.as_str()))
}

pub fn age_group_options(stats: &[MonthlyStat]) -> Vec<String> {
    distinct_sorted(stats.iter().map(|s| s.age_group.as_str()))
}

fn distinct_sorted<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// One point of the monthly trend lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub total_runners: usize,
    pub distance: f64,
    pub speed_per_hour: f64,
    pub duration: f64,
}

/// Collapses the demographic breakdown into one row per (year, month), ascending.
pub fn monthly_summary(stats: &[MonthlyStat]) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<(i32, u32), Vec<&MonthlyStat>> = BTreeMap::new();
    for stat in stats {
        months.entry((stat.year, stat.month)).or_default().push(stat);
    }

    months
        .into_iter()
        .map(|((year, month), rows)| {
            let distances: Vec<f64> = rows.iter().map(|s| s.distance).collect();
            let speeds: Vec<f64> = rows.iter().map(|s| s.speed_per_hour).collect();
            let durations: Vec<f64> = rows.iter().map(|s| s.duration).collect();

            MonthlySummary {
                year,
                month,
                label: format!("{}-{}", year, month),
                total_runners: rows.iter().map(|s| s.total_runners).sum(),
                distance: mean(&distances),
                speed_per_hour: mean(&speeds),
                duration: mean(&durations),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayRunners {
    pub weekday: &'static str,
    pub total_runners: f64,
}

/// Mean runners per weekday, Monday first. Days with no rows are omitted.
pub fn weekday_distribution(stats: &[MonthlyStat]) -> Vec<WeekdayRunners> {
    let mut by_day: HashMap<&str, Vec<f64>> = HashMap::new();
    for stat in stats {
        by_day
            .entry(stat.weekday.as_str())
            .or_default()
            .push(stat.total_runners as f64);
    }

    WEEK.iter()
        .map(|d| weekday_name(*d))
        .filter_map(|name| {
            by_day.get(name).map(|runners| WeekdayRunners {
                weekday: name,
                total_runners: mean(runners),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountrySpeed {
    pub country: String,
    pub speed_per_hour: f64,
}

/// The `limit` countries with the highest mean speed, ascending so the
/// fastest is drawn on top.
pub fn country_speed_board(stats: &[MonthlyStat], limit: usize) -> Vec<CountrySpeed> {
    let mut by_country: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for stat in stats {
        by_country
            .entry(stat.country.as_str())
            .or_default()
            .push(stat.speed_per_hour);
    }

    let mut board: Vec<CountrySpeed> = by_country
        .into_iter()
        .map(|(country, speeds)| CountrySpeed {
            country: country.to_string(),
            speed_per_hour: mean(&speeds),
        })
        .collect();

    board.sort_by(|a, b| b.speed_per_hour.total_cmp(&a.speed_per_hour));
    board.truncate(limit);
    board.reverse();
    board
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrosstabCell {
    pub age_group: String,
    pub gender: String,
    pub total_runners: usize,
}

/// Runners for every observed (age_group, gender) pair; absent pairs are 0.
pub fn gender_age_crosstab(stats: &[MonthlyStat]) -> Vec<CrosstabCell> {
    let mut sums: HashMap<(&str, &str), usize> = HashMap::new();
    for stat in stats {
        *sums
            .entry((stat.age_group.as_str(), stat.gender.as_str()))
            .or_default() += stat.total_runners;
    }

    let age_groups = age_group_options(stats);
    let genders = gender_options(stats);

    let mut cells = Vec::with_capacity(age_groups.len() * genders.len());
    for age_group in &age_groups {
        for gender in &genders {
            cells.push(CrosstabCell {
                age_group: age_group.clone(),
                gender: gender.clone(),
                total_runners: sums
                    .get(&(age_group.as_str(), gender.as_str()))
                    .copied()
                    .unwrap_or(0),
            });
        }
    }

    cells
}

/// Distinct `year_week` values in table order (chronological for a
/// persisted ranking table).
pub fn week_options(weekly: &[WeeklyCountryStat]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    weekly
        .iter()
        .filter(|w| seen.insert(w.year_week.as_str()))
        .map(|w| w.year_week.clone())
        .collect()
}

/// Most recent week of a chronologically sorted ranking table.
pub fn latest_week(weekly: &[WeeklyCountryStat]) -> Option<String> {
    weekly.last().map(|w| w.year_week.clone())
}

/// One row per country for `year_week`, countries ascending.
pub fn ranking_for_week(weekly: &[WeeklyCountryStat], year_week: &str) -> Vec<CountryRanking> {
    let mut by_country: BTreeMap<&str, Vec<&WeeklyCountryStat>> = BTreeMap::new();
    for row in weekly.iter().filter(|w| w.year_week == year_week) {
        by_country.entry(row.country.as_str()).or_default().push(row);
    }

    by_country
        .into_iter()
        .map(|(country, rows)| {
            let distances: Vec<f64> = rows.iter().map(|r| r.distance).collect();
            let durations: Vec<f64> = rows.iter().map(|r| r.duration).collect();
            CountryRanking {
                country: country.to_string(),
                total_runners: rows.iter().map(|r| r.total_runners).sum(),
                distance: mean(&distances),
                duration: mean(&durations),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(
        year: i32,
        month: u32,
        gender: &str,
        age_group: &str,
        weekday: &str,
        country: &str,
        speed: f64,
        runners: usize,
    ) -> MonthlyStat {
        MonthlyStat {
            year,
            month,
            gender: gender.to_string(),
            age_group: age_group.to_string(),
            weekday: weekday.to_string(),
            country: country.to_string(),
            distance: speed,
            duration: 60.0,
            speed_per_hour: speed,
            total_runners: runners,
        }
    }

    fn sample() -> Vec<MonthlyStat> {
        vec![
            stat(2019, 1, "M", "18 - 34", "Sunday", "Japan", 10.0, 4),
            stat(2019, 1, "F", "18 - 34", "Monday", "Japan", 8.0, 2),
            stat(2019, 2, "F", "35 - 54", "Monday", "Ghana", 12.0, 6),
            stat(2020, 1, "M", "55 +", "Friday", "Chile", 7.0, 1),
        ]
    }

    fn weekly(country: &str, year_week: &str, runners: usize, distance: f64) -> WeeklyCountryStat {
        WeeklyCountryStat {
            country: country.to_string(),
            year_week: year_week.to_string(),
            total_runners: runners,
            distance,
            duration: 30.0,
        }
    }

    #[test]
    fn test_overview() {
        let o = overview(&sample());
        assert_eq!(o.total_runners, 13);
        assert_eq!(o.speed_per_hour, 9.25);
        assert_eq!(o.duration, 60.0);
    }

    #[test]
    fn test_overview_empty() {
        assert_eq!(overview(&[]), Overview::default());
    }

    #[test]
    fn test_filter() {
        let all = DemographicFilter::default().apply(&sample());
        assert_eq!(all.len(), 4);

        let filter = DemographicFilter {
            gender: Some("F".to_string()),
            age_group: None,
        };
        let women = filter.apply(&sample());
        assert_eq!(women.len(), 2);
        assert!(women.iter().all(|s| s.gender == "F"));

        let filter = DemographicFilter {
            gender: Some("F".to_string()),
            age_group: Some("55 +".to_string()),
        };
        assert!(filter.apply(&sample()).is_empty());
    }

    #[test]
    fn test_options_are_sorted_and_distinct() {
        assert_eq!(gender_options(&sample()), vec!["F", "M"]);
        assert_eq!(
            age_group_options(&sample()),
            vec!["18 - 34", "35 - 54", "55 +"]
        );
    }

    #[test]
    fn test_monthly_summary() {
        let summary = monthly_summary(&sample());
        let labels: Vec<_> = summary.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["2019-1", "2019-2", "2020-1"]);
        assert_eq!(summary[0].total_runners, 6);
        assert_eq!(summary[0].speed_per_hour, 9.0);
    }

    #[test]
    fn test_weekday_distribution_order() {
        let dist = weekday_distribution(&sample());
        let days: Vec<_> = dist.iter().map(|d| d.weekday).collect();
        assert_eq!(days, vec!["Monday", "Friday", "Sunday"]);
        assert_eq!(dist[0].total_runners, 4.0);
    }

    #[test]
    fn test_country_speed_board() {
        let board = country_speed_board(&sample(), 2);
        let countries: Vec<_> = board.iter().map(|c| c.country.as_str()).collect();
        assert_eq!(countries, vec!["Japan", "Ghana"]);
        assert_eq!(board[0].speed_per_hour, 9.0);
    }

    #[test]
    fn test_crosstab_fills_missing_pairs() {
        let cells = gender_age_crosstab(&sample());
        assert_eq!(cells.len(), 6);

        let lookup = |age: &str, gender: &str| {
            cells
                .iter()
                .find(|c| c.age_group == age && c.gender == gender)
                .map(|c| c.total_runners)
        };
        assert_eq!(lookup("18 - 34", "M"), Some(4));
        assert_eq!(lookup("35 - 54", "M"), Some(0));
        assert_eq!(lookup("55 +", "F"), Some(0));
    }

    #[test]
    fn test_week_options_and_latest() {
        let table = vec![
            weekly("Chile", "2019-52", 3, 5.0),
            weekly("Peru", "2019-52", 2, 6.0),
            weekly("Chile", "2020-1", 1, 7.0),
        ];

        assert_eq!(week_options(&table), vec!["2019-52", "2020-1"]);
        assert_eq!(latest_week(&table).as_deref(), Some("2020-1"));
        assert!(latest_week(&[]).is_none());
    }

    #[test]
    fn test_ranking_for_week() {
        let table = vec![
            weekly("Peru", "2019-52", 2, 6.0),
            weekly("Chile", "2019-52", 3, 5.0),
            weekly("Chile", "2020-1", 1, 7.0),
        ];

        let ranking = ranking_for_week(&table, "2019-52");
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].country, "Chile");
        assert_eq!(ranking[0].total_runners, 3);
        assert_eq!(ranking[1].distance, 6.0);

        assert!(ranking_for_week(&table, "2018-1").is_empty());
    }
}
