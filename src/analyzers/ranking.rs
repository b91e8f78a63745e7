//! Leaderboard selection for the weekly country ranking.
//!
//! A truncated top-N board that always shows one pinned country, ordered
//! bottom-to-top for a horizontal bar chart and decorated by final position.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::analyzers::types::CountryRanking;

/// Number of countries shown on a leaderboard.
pub const DEFAULT_TOP_N: usize = 20;

/// Ranking table column a leaderboard is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    TotalRunners,
    Distance,
    Duration,
}

impl RankMetric {
    pub fn column(&self) -> &'static str {
        match self {
            RankMetric::TotalRunners => "total_runners",
            RankMetric::Distance => "distance",
            RankMetric::Duration => "duration",
        }
    }

    pub fn value(&self, row: &CountryRanking) -> f64 {
        match self {
            RankMetric::TotalRunners => row.total_runners as f64,
            RankMetric::Distance => row.distance,
            RankMetric::Duration => row.duration,
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            RankMetric::TotalRunners => "Active runners ranking (Top 20)",
            RankMetric::Distance => "Average running distance ranking (Top 20)",
            RankMetric::Duration => "Average running time ranking (Top 20)",
        }
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            RankMetric::TotalRunners => "Runners",
            RankMetric::Distance => "Distance (km)",
            RankMetric::Duration => "Duration (min)",
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for RankMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total_runners" | "runners" => Ok(RankMetric::TotalRunners),
            "distance" => Ok(RankMetric::Distance),
            "duration" => Ok(RankMetric::Duration),
            other => Err(format!(
                "unknown ranking metric '{other}' (expected total_runners, distance or duration)"
            )),
        }
    }
}

/// Visual treatment of one leaderboard row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoration {
    Gold,
    Silver,
    Bronze,
    Pinned,
    Neutral,
}

impl Decoration {
    pub fn color(&self) -> &'static str {
        match self {
            Decoration::Gold => "#FFD700",
            Decoration::Silver => "#C0C0C0",
            Decoration::Bronze => "#CD7F32",
            Decoration::Pinned => "#FF6B6B",
            Decoration::Neutral => "#87CEEB",
        }
    }

    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Decoration::Gold => Some("🥇"),
            Decoration::Silver => Some("🥈"),
            Decoration::Bronze => Some("🥉"),
            Decoration::Pinned => Some("🎯"),
            Decoration::Neutral => None,
        }
    }
}

/// Maps a 1-based display rank to its decoration. Medals win over the pin.
///
/// | Rank | Pinned | Decoration |
/// |------|--------|------------|
/// | 1    | any    | Gold       |
/// | 2    | any    | Silver     |
/// | 3    | any    | Bronze     |
/// | > 3  | yes    | Pinned     |
/// | > 3  | no     | Neutral    |
pub fn decoration(rank: usize, pinned: bool) -> Decoration {
    match rank {
        1 => Decoration::Gold,
        2 => Decoration::Silver,
        3 => Decoration::Bronze,
        _ if pinned => Decoration::Pinned,
        _ => Decoration::Neutral,
    }
}

/// Display ranks for a bottom-to-top sequence of `len` rows: the last row
/// is rank 1.
pub fn display_ranks(len: usize) -> impl Iterator<Item = usize> {
    (1..=len).rev()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub country: String,
    pub value: f64,
    pub decoration: Decoration,
    pub color: &'static str,
    pub marker: Option<&'static str>,
}

/// A display-ready leaderboard, in ascending metric order (rank 1 last).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingSelection {
    pub metric: RankMetric,
    /// Set only when the pinned country exists in the ranking table.
    pub pinned: Option<String>,
    pub entries: Vec<RankedEntry>,
}

impl RankingSelection {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn leader(&self) -> Option<&RankedEntry> {
        self.entries.last()
    }
}

/// Selects the top `top_n` countries by `metric` and force-includes `pinned`.
///
/// Ties keep input order (first seen ranks higher). When `pinned` is outside
/// the top N it is appended once, making `top_n + 1` rows; when it is not in
/// the table at all the board is the plain top N.
pub fn select(
    table: &[CountryRanking],
    pinned: &str,
    metric: RankMetric,
    top_n: usize,
) -> RankingSelection {
    let mut descending: Vec<&CountryRanking> = table.iter().collect();
    descending.sort_by(|a, b| metric.value(b).total_cmp(&metric.value(a)));

    let mut display: Vec<&CountryRanking> = descending.iter().take(top_n).copied().collect();

    let pinned_row = descending.iter().find(|r| r.country == pinned).copied();
    if let Some(row) = pinned_row {
        if !display.iter().any(|r| r.country == pinned) {
            display.push(row);
        }
    }

    // `display` is descending with ties in first-seen order; reversing yields
    // ascending order with the first-seen of any tie nearest the top.
    display.reverse();

    let len = display.len();
    let entries = display
        .into_iter()
        .zip(display_ranks(len))
        .map(|(row, rank)| {
            let decoration = decoration(rank, row.country == pinned);
            RankedEntry {
                rank,
                country: row.country.clone(),
                value: metric.value(row),
                decoration,
                color: decoration.color(),
                marker: decoration.marker(),
            }
        })
        .collect();

    RankingSelection {
        metric,
        pinned: pinned_row.map(|r| r.country.clone()),
        entries,
    }
}

/// What the presentation layer asks for when drawing one leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRequest {
    pub country: String,
    pub metric: RankMetric,
    pub title: String,
    pub axis_label: String,
    pub top_n: usize,
}

impl RankingRequest {
    /// Request with the metric's default title and axis label.
    pub fn new(country: &str, metric: RankMetric) -> Self {
        Self {
            country: country.to_string(),
            metric,
            title: metric.default_title().to_string(),
            axis_label: metric.axis_label().to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// A leaderboard plus the labels needed to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingChart {
    pub title: String,
    pub axis_label: String,
    #[serde(flatten)]
    pub selection: RankingSelection,
}

impl RankingChart {
    pub fn build(table: &[CountryRanking], request: &RankingRequest) -> Self {
        Self {
            title: request.title.clone(),
            axis_label: request.axis_label.clone(),
            selection: select(table, &request.country, request.metric, request.top_n),
        }
    }
}
