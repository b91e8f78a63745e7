use run_dashboard::analyzers::analyzer::preprocess;
use run_dashboard::analyzers::ranking::{Decoration, RankMetric, RankingChart, RankingRequest};
use run_dashboard::analyzers::summary::{latest_week, ranking_for_week, week_options};
use run_dashboard::config::DashboardConfig;
use run_dashboard::store::{CsvDatasetStore, Dataset, DatasetStore};
use std::env;
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn config_for(test: &str) -> DashboardConfig {
    let processed_dir = env::temp_dir().join(format!("run_dashboard_it_{}", test));
    let _ = fs::remove_dir_all(&processed_dir); // clean up any prior run

    DashboardConfig {
        raw_sources: vec![fixture("run_ww_2019_d.csv"), fixture("run_ww_2020_d.csv")],
        processed_dir,
        ..Default::default()
    }
}

#[test]
fn test_full_pipeline() {
    let config = config_for("full");
    let tables = preprocess(&config).expect("pipeline failed");

    let saturday_run = tables
        .monthly_stats
        .iter()
        .find(|s| s.country == "Germany")
        .expect("Germany row missing");
    assert_eq!(saturday_run.year, 2019);
    assert_eq!(saturday_run.month, 6);
    assert_eq!(saturday_run.weekday, "Saturday");
    assert_eq!(saturday_run.speed_per_hour, 10.0);
    assert_eq!(saturday_run.total_runners, 1);

    // Outliers and zero-valued runs never reach any table.
    for excluded in ["Outlandia", "Zeroland"] {
        assert!(tables.monthly_stats.iter().all(|s| s.country != excluded));
        assert!(tables.weekly_ranking.iter().all(|w| w.country != excluded));
    }

    // The undated run is kept for the density table only.
    assert_eq!(tables.distance_duration.total_count(), 11);
    assert!(tables.distance_duration.cells.len() <= 100 * 100);

    fs::remove_dir_all(&config.processed_dir).unwrap();
}

#[test]
fn test_distinct_runner_counts() {
    let config = config_for("distinct");
    let tables = preprocess(&config).unwrap();

    let kenya_women = tables
        .monthly_stats
        .iter()
        .find(|s| s.country == "Kenya" && s.gender == "F" && s.year == 2019)
        .unwrap();
    assert_eq!(kenya_women.total_runners, 1);
    assert_eq!(kenya_women.distance, 8.5);

    let kenya_week = tables
        .weekly_ranking
        .iter()
        .find(|w| w.country == "Kenya" && w.year_week == "2019-52")
        .unwrap();
    assert_eq!(kenya_week.total_runners, 2);

    fs::remove_dir_all(&config.processed_dir).unwrap();
}

#[test]
fn test_weekly_ranking_is_chronological() {
    let config = config_for("chronological");
    let tables = preprocess(&config).unwrap();

    assert_eq!(
        week_options(&tables.weekly_ranking),
        vec!["2019-24", "2019-52", "2020-1", "2020-2"]
    );

    // The 0.8 km run does not qualify for the weekly table.
    assert!(
        tables
            .weekly_ranking
            .iter()
            .all(|w| !(w.country == "Brazil" && w.year_week == "2020-2"))
    );

    fs::remove_dir_all(&config.processed_dir).unwrap();
}

#[test]
fn test_pipeline_is_idempotent() {
    let first = config_for("idempotent_a");
    let second = config_for("idempotent_b");

    preprocess(&first).unwrap();
    preprocess(&second).unwrap();

    for dataset in Dataset::ALL {
        let a = fs::read(dataset.path_in(&first.processed_dir)).unwrap();
        let b = fs::read(dataset.path_in(&second.processed_dir)).unwrap();
        assert_eq!(a, b, "{dataset} differs between runs");
    }

    fs::remove_dir_all(&first.processed_dir).unwrap();
    fs::remove_dir_all(&second.processed_dir).unwrap();
}

#[test]
fn test_missing_raw_source_is_fatal() {
    let mut config = config_for("missing_raw");
    config.raw_sources.push(fixture("run_ww_2021_d.csv"));

    let err = preprocess(&config).unwrap_err();
    assert!(err.to_string().contains("run_ww_2021_d.csv"));
}

#[test]
fn test_store_serves_ranking_board() {
    let config = config_for("store");
    let store = CsvDatasetStore::new(config.clone());

    let weekly = store
        .get_or_compute(Dataset::WeeklyRanking)
        .unwrap()
        .into_weekly_ranking()
        .unwrap();
    assert_eq!(latest_week(&weekly).as_deref(), Some("2020-2"));

    // Served from the persisted file this time.
    let cached = store
        .get_or_compute(Dataset::WeeklyRanking)
        .unwrap()
        .into_weekly_ranking()
        .unwrap();
    assert_eq!(cached, weekly);

    let table = ranking_for_week(&cached, "2019-52");
    let request = RankingRequest::new("Japan", RankMetric::TotalRunners).with_top_n(1);
    let chart = RankingChart::build(&table, &request);

    let rows: Vec<_> = chart
        .selection
        .entries
        .iter()
        .map(|e| (e.country.as_str(), e.rank, e.decoration))
        .collect();
    assert_eq!(
        rows,
        vec![("Japan", 2, Decoration::Silver), ("Kenya", 1, Decoration::Gold)]
    );
    assert_eq!(chart.selection.pinned.as_deref(), Some("Japan"));

    fs::remove_dir_all(&config.processed_dir).unwrap();
}
