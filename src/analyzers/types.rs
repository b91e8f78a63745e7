//! Row types of the derived tables.

use serde::{Deserialize, Serialize};

use crate::activity::Measure;

/// One row of `running_Y_M_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStat {
    pub year: i32,
    pub month: u32,
    pub gender: String,
    pub age_group: String,
    pub weekday: String,
    pub country: String,
    pub distance: f64,
    pub duration: f64,
    pub speed_per_hour: f64,
    pub total_runners: usize,
}

/// One non-empty cell of a 2D histogram, located by its bin centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityCell {
    pub x: f64,
    pub y: f64,
    pub count: u64,
}

/// Sparse 2D histogram over two activity measures.
///
/// Persisted as `distance_duration_df` with the axis columns named after
/// the measures, e.g. `distance,duration,count`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityTable {
    pub x: Measure,
    pub y: Measure,
    pub cells: Vec<DensityCell>,
}

impl DensityTable {
    pub fn empty(x: Measure, y: Measure) -> Self {
        Self {
            x,
            y,
            cells: Vec::new(),
        }
    }

    /// Total number of activities represented by the table.
    pub fn total_count(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }
}

/// One row of `running_W_ranking`: a country's qualifying activity in one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyCountryStat {
    pub country: String,
    pub year_week: String,
    pub total_runners: usize,
    pub distance: f64,
    pub duration: f64,
}

/// A country's standing in a single week, the input of the ranking selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRanking {
    pub country: String,
    pub total_runners: usize,
    pub distance: f64,
    pub duration: f64,
}
