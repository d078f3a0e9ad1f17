#![forbid(unsafe_code)]

//! Core domain model and cycle engine for Luna.
//!
//! This crate provides:
//! - Domain types (settings, period and daily logs, derived cycle info)
//! - Phase calculation and predictions
//! - Calendar month projection
//! - Reconciliation of logged data with predictions
//! - Persistence traits and a file-backed store
//! - Symptom catalog, configuration and CSV export

pub mod types;
pub mod error;
pub mod datemath;
pub mod phase;
pub mod prediction;
pub mod calendar;
pub mod reconcile;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod tracker;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{default_catalog, SymptomCatalog};
pub use config::Config;
pub use phase::{compute_cycle_info, compute_cycle_position, CyclePosition};
pub use prediction::{predict, Predictions};
pub use calendar::{project_month, project_month_aligned};
pub use reconcile::{merge_logs, merge_period_logs};
pub use store::{
    CycleStore, DailyLogStore, FileStore, PeriodLogStore, SettingsStore, UserGuard, UserLock,
};
pub use tracker::CycleTracker;
pub use export::export_periods_csv;
