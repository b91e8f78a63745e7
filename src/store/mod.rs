//! Read-through cache of derived tables.
//!
//! [`Dataset`] names a derived table, [`Table`] carries its typed rows.
//! [`DatasetStore`] is the cache contract; [`CsvDatasetStore`] implements it
//! on top of CSV files, recomputing from raw sources when a file is absent.

mod csv_store;

pub use csv_store::CsvDatasetStore;

use anyhow::{Result, bail};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::analyzers::types::{DensityTable, MonthlyStat, WeeklyCountryStat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    MonthlyStats,
    DistanceDuration,
    WeeklyRanking,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [
        Dataset::MonthlyStats,
        Dataset::DistanceDuration,
        Dataset::WeeklyRanking,
    ];

    /// Logical name, also the persisted file stem.
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::MonthlyStats => "running_Y_M_stats",
            Dataset::DistanceDuration => "distance_duration_df",
            Dataset::WeeklyRanking => "running_W_ranking",
        }
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.csv", self.name()))
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The rows of one derived table.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    MonthlyStats(Vec<MonthlyStat>),
    DistanceDuration(DensityTable),
    WeeklyRanking(Vec<WeeklyCountryStat>),
}

impl Table {
    pub fn dataset(&self) -> Dataset {
        match self {
            Table::MonthlyStats(_) => Dataset::MonthlyStats,
            Table::DistanceDuration(_) => Dataset::DistanceDuration,
            Table::WeeklyRanking(_) => Dataset::WeeklyRanking,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Table::MonthlyStats(rows) => rows.len(),
            Table::DistanceDuration(table) => table.cells.len(),
            Table::WeeklyRanking(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_monthly_stats(self) -> Result<Vec<MonthlyStat>> {
        match self {
            Table::MonthlyStats(rows) => Ok(rows),
            other => bail!("expected {}, got {}", Dataset::MonthlyStats, other.dataset()),
        }
    }

    pub fn into_density(self) -> Result<DensityTable> {
        match self {
            Table::DistanceDuration(table) => Ok(table),
            other => bail!(
                "expected {}, got {}",
                Dataset::DistanceDuration,
                other.dataset()
            ),
        }
    }

    pub fn into_weekly_ranking(self) -> Result<Vec<WeeklyCountryStat>> {
        match self {
            Table::WeeklyRanking(rows) => Ok(rows),
            other => bail!("expected {}, got {}", Dataset::WeeklyRanking, other.dataset()),
        }
    }
}

/// A cache of derived tables keyed by [`Dataset`].
///
/// Computation is synchronous; callers must not trigger the same dataset from
/// several threads at once. Invalidation is always explicit.
pub trait DatasetStore {
    /// Returns the cached table, computing and persisting it first if absent.
    fn get_or_compute(&self, dataset: Dataset) -> Result<Table>;

    /// Drops the cached table so the next read recomputes it.
    fn invalidate(&self, dataset: Dataset) -> Result<()>;
}
