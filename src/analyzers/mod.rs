//! Derived-table computation and dashboard data preparation.
//!
//! This module turns cleaned activities into the monthly stats, density and
//! weekly ranking tables, and prepares leaderboard and summary views from them.

pub mod aggregate;
pub mod analyzer;
pub mod density;
pub mod ranking;
pub mod summary;
pub mod types;
pub mod utility;
