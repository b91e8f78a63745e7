use anyhow::Result;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{Dataset, DatasetStore, Table};
use crate::activity::Measure;
use crate::analyzers::analyzer::{DerivedTables, preprocess};
use crate::config::DashboardConfig;
use crate::output::{read_density, read_table};

/// Derived tables persisted as CSV files under `processed_dir`.
///
/// A missing file triggers one full pipeline run, which rewrites all three
/// tables and serves the requested one from memory.
pub struct CsvDatasetStore {
    config: DashboardConfig,
}

impl CsvDatasetStore {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn path(&self, dataset: Dataset) -> PathBuf {
        dataset.path_in(&self.config.processed_dir)
    }

    /// Recomputes every table from the raw sources, ignoring cached files.
    pub fn refresh(&self) -> Result<DerivedTables> {
        preprocess(&self.config)
    }

    fn read(&self, dataset: Dataset) -> Result<Table> {
        let path = self.path(dataset);
        let table = match dataset {
            Dataset::MonthlyStats => Table::MonthlyStats(read_table(&path)?),
            Dataset::DistanceDuration => {
                Table::DistanceDuration(read_density(&path, Measure::Distance, Measure::Duration)?)
            }
            Dataset::WeeklyRanking => Table::WeeklyRanking(read_table(&path)?),
        };
        Ok(table)
    }
}

impl DatasetStore for CsvDatasetStore {
    fn get_or_compute(&self, dataset: Dataset) -> Result<Table> {
        let path = self.path(dataset);

        if path.exists() {
            debug!(%dataset, path = %path.display(), "Serving cached table");
            return self.read(dataset);
        }

        info!(%dataset, path = %path.display(), "Derived table missing, recomputing");
        Ok(self.refresh()?.into_table(dataset))
    }

    fn invalidate(&self, dataset: Dataset) -> Result<()> {
        let path = self.path(dataset);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(%dataset, path = %path.display(), "Cached table removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
