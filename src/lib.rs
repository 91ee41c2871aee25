//! ranking-tracker - daily per-category product ranking snapshots
//!
//! Renders each category's ranking listing, extracts and normalizes the
//! ranked products, and replaces that day's snapshot in SQLite on a timer.

pub mod config;
pub mod database;
pub mod error;
pub mod extractor;
pub mod models;
pub mod normalizer;
pub mod renderer;
pub mod scheduler;
pub mod tracker;
pub mod traits;

pub use config::{Category, CategoryTable, Config};
pub use database::Database;
pub use error::ScrapeError;
pub use tracker::{CycleOutcome, CycleReport, RankingTracker, RefreshOutcome};
