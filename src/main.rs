//! CLI entry point for the running dashboard backend.
//!
//! Provides subcommands for rebuilding the derived tables, printing the
//! summary views, listing ranking weeks, and producing a weekly leaderboard.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use run_dashboard::analyzers::ranking::{RankMetric, RankingChart, RankingRequest};
use run_dashboard::analyzers::summary::{
    DemographicFilter, SPEED_BOARD_SIZE, country_speed_board, gender_age_crosstab, latest_week,
    monthly_summary, overview, ranking_for_week, week_options, weekday_distribution,
};
use run_dashboard::config::DashboardConfig;
use run_dashboard::output::print_json;
use run_dashboard::store::{CsvDatasetStore, Dataset, DatasetStore};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "run_dashboard")]
#[command(about = "Derives running statistics and leaderboards from raw activity files", long_about = None)]
struct Cli {
    /// JSON config file (falls back to $RUN_DASHBOARD_CONFIG, then defaults)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute all derived tables from the raw sources
    Preprocess,
    /// Print overview metrics and demographic views
    Summary {
        /// Only include this gender (e.g. "M" or "F")
        #[arg(short, long)]
        gender: Option<String>,

        /// Only include this age group (e.g. "18 - 34")
        #[arg(short, long)]
        age_group: Option<String>,
    },
    /// List the weeks available in the weekly ranking table
    Weeks,
    /// Print the leaderboard for one week with a pinned country
    Ranking {
        /// Country that must appear on the board
        #[arg(long)]
        country: String,

        /// Week as "{year}-{iso week}" (default: most recent)
        #[arg(short, long)]
        week: Option<String>,

        /// Column to rank by: total_runners, distance or duration
        #[arg(short, long, default_value = "total_runners")]
        metric: RankMetric,

        /// Board size before the pinned country is added
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/run_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("run_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::resolve(cli.config.as_deref())?;
    let store = CsvDatasetStore::new(config);

    match cli.command {
        Commands::Preprocess => {
            let tables = store.refresh()?;
            info!(
                monthly_rows = tables.monthly_stats.len(),
                density_cells = tables.distance_duration.cells.len(),
                weekly_rows = tables.weekly_ranking.len(),
                processed_dir = %store.config().processed_dir.display(),
                "Preprocessing finished"
            );
        }
        Commands::Summary { gender, age_group } => {
            summary(&store, DemographicFilter { gender, age_group })?;
        }
        Commands::Weeks => {
            let weekly = store
                .get_or_compute(Dataset::WeeklyRanking)?
                .into_weekly_ranking()?;
            let weeks = week_options(&weekly);
            info!(count = weeks.len(), latest = ?weeks.last(), "Ranking weeks");
            print_json(&weeks)?;
        }
        Commands::Ranking {
            country,
            week,
            metric,
            top_n,
        } => {
            let top_n = top_n.unwrap_or(store.config().top_n);
            ranking(&store, &country, week, metric, top_n)?;
        }
    }

    Ok(())
}

/// Logs the overview cards and every demographic view for `filter`.
#[tracing::instrument(skip(store))]
fn summary(store: &CsvDatasetStore, filter: DemographicFilter) -> Result<()> {
    let stats = store
        .get_or_compute(Dataset::MonthlyStats)?
        .into_monthly_stats()?;
    let density = store
        .get_or_compute(Dataset::DistanceDuration)?
        .into_density()?;

    info!(
        rows = stats.len(),
        density_cells = density.cells.len(),
        activities = density.total_count(),
        "Tables loaded"
    );
    print_json(&overview(&stats))?;
    print_json(&gender_age_crosstab(&stats))?;

    let filtered = filter.apply(&stats);
    if filtered.is_empty() {
        warn!("No rows match the selected gender / age group");
        return Ok(());
    }

    print_json(&overview(&filtered))?;
    print_json(&monthly_summary(&filtered))?;
    print_json(&weekday_distribution(&filtered))?;
    print_json(&country_speed_board(&filtered, SPEED_BOARD_SIZE))?;

    Ok(())
}

/// Builds and prints the leaderboard for `week` (or the latest week).
#[tracing::instrument(skip(store))]
fn ranking(
    store: &CsvDatasetStore,
    country: &str,
    week: Option<String>,
    metric: RankMetric,
    top_n: usize,
) -> Result<()> {
    let weekly = store
        .get_or_compute(Dataset::WeeklyRanking)?
        .into_weekly_ranking()?;

    let Some(week) = week.or_else(|| latest_week(&weekly)) else {
        bail!("weekly ranking table is empty");
    };

    let table = ranking_for_week(&weekly, &week);
    if table.is_empty() {
        warn!(week = %week, "No ranking rows for this week");
    }

    let request = RankingRequest::new(country, metric).with_top_n(top_n);
    let chart = RankingChart::build(&table, &request);
    if chart.selection.pinned.is_none() {
        warn!(country, week = %week, "Country has no qualifying activity this week");
    }

    print_json(&chart)?;
    Ok(())
}
