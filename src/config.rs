//! Dashboard pipeline configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analyzers::density::DensityParams;
use crate::analyzers::ranking::DEFAULT_TOP_N;

/// Environment variable naming a config file when none is passed explicitly.
pub const CONFIG_ENV: &str = "RUN_DASHBOARD_CONFIG";

/// Where raw activities come from and where derived tables go.
///
/// Stored as JSON; every field is optional:
/// ```json
/// {
///   "raw_sources": ["data/raw/run_ww_2019_d.csv", "data/raw/run_ww_2020_d.csv"],
///   "processed_dir": "data/processed",
///   "density": { "x_bins": 100, "y_bins": 100, "min_count": 1 },
///   "top_n": 20
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub raw_sources: Vec<PathBuf>,
    pub processed_dir: PathBuf,
    pub density: DensityParams,
    pub top_n: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            raw_sources: vec![
                PathBuf::from("data/raw/run_ww_2019_d.csv"),
                PathBuf::from("data/raw/run_ww_2020_d.csv"),
            ],
            processed_dir: PathBuf::from("data/processed"),
            density: DensityParams::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl DashboardConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Uses `explicit` if given, else the file named by [`CONFIG_ENV`],
    /// else the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}
