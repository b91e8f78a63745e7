use crate::activity::{ActivityRecord, Measure, prepare};
use crate::analyzers::aggregate::{monthly_stats, weekly_country_stats};
use crate::analyzers::density::{DensityParams, compress};
use crate::analyzers::types::{DensityTable, MonthlyStat, WeeklyCountryStat};
use crate::config::DashboardConfig;
use crate::output::{write_density, write_table};
use crate::parser::load_sources;
use crate::store::{Dataset, Table};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// The three tables one pipeline run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTables {
    pub monthly_stats: Vec<MonthlyStat>,
    pub distance_duration: DensityTable,
    pub weekly_ranking: Vec<WeeklyCountryStat>,
}

impl DerivedTables {
    /// Derives every table from cleaned activities.
    pub fn build(records: &[ActivityRecord], density: &DensityParams) -> Self {
        Self {
            monthly_stats: monthly_stats(records),
            distance_duration: compress(records, Measure::Distance, Measure::Duration, density),
            weekly_ranking: weekly_country_stats(records),
        }
    }

    /// Writes every table into `dir` as `<dataset name>.csv`.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        write_table(
            &Dataset::MonthlyStats.path_in(dir),
            &self.monthly_stats,
        )?;
        write_density(
            &Dataset::DistanceDuration.path_in(dir),
            &self.distance_duration,
        )?;
        write_table(
            &Dataset::WeeklyRanking.path_in(dir),
            &self.weekly_ranking,
        )?;

        info!(dir = %dir.display(), "Derived tables written");
        Ok(())
    }

    pub fn into_table(self, dataset: Dataset) -> Table {
        match dataset {
            Dataset::MonthlyStats => Table::MonthlyStats(self.monthly_stats),
            Dataset::DistanceDuration => Table::DistanceDuration(self.distance_duration),
            Dataset::WeeklyRanking => Table::WeeklyRanking(self.weekly_ranking),
        }
    }
}

/// Loads every raw source, cleans it, derives the tables and persists them.
///
/// # Errors
///
/// Fails when a raw source is missing or unreadable, or a table cannot be written.
#[tracing::instrument(skip(config), fields(sources = config.raw_sources.len()))]
pub fn preprocess(config: &DashboardConfig) -> Result<DerivedTables> {
    let raw = load_sources(&config.raw_sources)?;
    let records = prepare(raw);

    let tables = DerivedTables::build(&records, &config.density);
    info!(
        activities = records.len(),
        monthly_rows = tables.monthly_stats.len(),
        density_cells = tables.distance_duration.cells.len(),
        weekly_rows = tables.weekly_ranking.len(),
        "Derived tables computed"
    );

    tables.persist(&config.processed_dir)?;
    Ok(tables)
}
