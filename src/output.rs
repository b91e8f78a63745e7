//! Persistence and logging for derived tables.
//!
//! Tables are flat CSV files with a header row. The density table carries
//! its axis names in the header, so it has dedicated reader/writer functions.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::activity::Measure;
use crate::analyzers::types::{DensityCell, DensityTable};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Writes `rows` to `path`, replacing any existing file.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    debug!(path = %path.display(), rows = rows.len(), "Writing table");

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads every row of a table written by [`write_table`].
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("bad row in {}", path.display()))?;
        rows.push(record);
    }

    Ok(rows)
}

/// Writes a density table as `<x column>,<y column>,count`.
pub fn write_density(path: &Path, table: &DensityTable) -> Result<()> {
    ensure_parent(path)?;
    debug!(path = %path.display(), cells = table.cells.len(), "Writing density table");

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([table.x.column(), table.y.column(), "count"])?;
    for cell in &table.cells {
        writer.serialize(cell)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads a density table, checking that its header names the expected axes.
pub fn read_density(path: &Path, x: Measure, y: Measure) -> Result<DensityTable> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let expected = [x.column(), y.column(), "count"];
    if headers.iter().ne(expected) {
        bail!(
            "unexpected density header in {}: {:?}",
            path.display(),
            headers.iter().collect::<Vec<_>>()
        );
    }

    let mut cells = Vec::new();
    for result in rdr.records() {
        let cell: DensityCell = result?.deserialize(None)?;
        cells.push(cell);
    }

    Ok(DensityTable { x, y, cells })
}
