//! Raw activity source loading.
//!
//! Sources are flat CSV files, one row per run, optionally gzip-compressed.
//! Yearly files are concatenated in the order the caller lists them.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Datetime layouts accepted for the `datetime` column, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A single row as it appears in a raw source file.
///
/// Numeric cells that are empty or malformed deserialize to `None` instead of
/// failing the whole file; cleaning drops those rows later.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawActivity {
    pub datetime: String,
    pub athlete: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub duration: Option<f64>,
    pub gender: String,
    pub age_group: String,
    pub country: String,
}

/// Parses a raw timestamp string. Returns `None` when no known layout matches.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Reads raw activity rows from any CSV reader.
///
/// Unknown columns (such as a leading unnamed index column) are ignored.
pub fn read_activities<R: Read>(reader: R) -> Result<Vec<RawActivity>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: RawActivity = result?;
        rows.push(record);
    }

    Ok(rows)
}

/// Reads one raw source file. Files ending in `.gz` are decompressed on the fly.
///
/// # Errors
///
/// A missing file is a configuration error and is reported with its path.
pub fn read_source(path: &Path) -> Result<Vec<RawActivity>> {
    if !path.exists() {
        bail!("raw source not found: {}", path.display());
    }

    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(path = %path.display(), gzipped, "Reading raw source");

    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    read_activities(reader).with_context(|| format!("failed to parse {}", path.display()))
}

/// Concatenates every source in order, preserving row order within each file.
pub fn load_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RawActivity>> {
    let mut rows = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let chunk = read_source(path)?;
        info!(path = %path.display(), rows = chunk.len(), "Loaded raw source");
        rows.extend(chunk);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    const SAMPLE: &str = "\
,datetime,athlete,distance,duration,gender,age_group,country
0,2019-06-15,17,10.0,60.0,M,18 - 34,Germany
1,2019-06-16,18,,45.5,F,35 - 54,France
2,not a date,19,5.2,30.0,F,55 +,Spain
";

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        let ts = parse_timestamp("2019-06-15").unwrap();
        assert_eq!(ts.year(), 2019);
        assert_eq!(ts.month(), 6);
        assert_eq!(ts.day(), 15);
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_with_time() {
        let ts = parse_timestamp("2020-01-02 07:30:00").unwrap();
        assert_eq!(ts.hour(), 7);
        assert_eq!(ts.minute(), 30);

        let ts = parse_timestamp("2020-01-02T07:30:00.250").unwrap();
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_rfc3339_keeps_local_time() {
        let ts = parse_timestamp("2020-01-02T07:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 7);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2019-13-45").is_none());
    }

    #[test]
    fn test_read_activities_ignores_index_column() {
        let rows = read_activities(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].athlete, "17");
        assert_eq!(rows[0].distance, Some(10.0));
        assert_eq!(rows[0].age_group, "18 - 34");
        assert_eq!(rows[0].country, "Germany");
    }

    #[test]
    fn test_read_activities_empty_number_is_none() {
        let rows = read_activities(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows[1].distance, None);
        assert_eq!(rows[1].duration, Some(45.5));
    }

    #[test]
    fn test_read_source_missing_file() {
        let err = read_source(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("raw source not found"));
    }

    #[test]
    fn test_read_source_gzip() {
        let path = temp_path("run_dashboard_parser_test.csv.gz");
        let _ = fs::remove_file(&path);

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let rows = read_source(Path::new(&path)).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].datetime, "not a date");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_sources_preserves_order() {
        let first = temp_path("run_dashboard_parser_first.csv");
        let second = temp_path("run_dashboard_parser_second.csv");
        fs::write(
            &first,
            "datetime,athlete,distance,duration,gender,age_group,country\n\
             2019-01-01,a,1,10,M,18 - 34,Chile\n\
             2019-01-02,b,2,20,M,18 - 34,Chile\n",
        )
        .unwrap();
        fs::write(
            &second,
            "datetime,athlete,distance,duration,gender,age_group,country\n\
             2020-01-01,c,3,30,F,18 - 34,Peru\n",
        )
        .unwrap();

        let rows = load_sources(&[&second, &first]).unwrap();
        let athletes: Vec<_> = rows.iter().map(|r| r.athlete.as_str()).collect();
        assert_eq!(athletes, vec!["c", "a", "b"]);

        fs::remove_file(&first).unwrap();
        fs::remove_file(&second).unwrap();
    }
}
