//! Core domain types for Luna.
//!
//! This module defines the fundamental types used throughout the system:
//! - Cycle settings and their domains
//! - Logged events (period starts, daily entries)
//! - Derived values (cycle info, calendar cells)

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Defaults and Domains
// ============================================================================

pub const DEFAULT_CYCLE_LENGTH: u32 = 28;
pub const DEFAULT_PERIOD_LENGTH: u32 = 5;

/// Accepted average cycle lengths, in days
pub const CYCLE_LENGTH_RANGE: RangeInclusive<u32> = 15..=60;

/// Accepted average period lengths, in days
pub const PERIOD_LENGTH_RANGE: RangeInclusive<u32> = 1..=14;

// ============================================================================
// Enumerations
// ============================================================================

/// Menstrual flow intensity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Spotting,
    Light,
    Medium,
    Heavy,
}

impl Flow {
    /// Spotting is recorded but does not mark a period day
    pub fn counts_as_period(self) -> bool {
        !matches!(self, Flow::Spotting)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Spotting => "spotting",
            Flow::Light => "light",
            Flow::Medium => "medium",
            Flow::Heavy => "heavy",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "spotting" => Ok(Flow::Spotting),
            "light" => Ok(Flow::Light),
            "medium" => Ok(Flow::Medium),
            "heavy" => Ok(Flow::Heavy),
            other => Err(Error::Validation(format!("unknown flow '{}'", other))),
        }
    }
}

/// Phase of the menstrual cycle
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Menstrual => "menstrual",
            Phase::Follicular => "follicular",
            Phase::Ovulatory => "ovulatory",
            Phase::Luteal => "luteal",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First column of the month grid
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

// ============================================================================
// Settings
// ============================================================================

/// Per-user cycle configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleSettings {
    pub user_id: String,
    pub average_cycle_length: u32,
    pub average_period_length: u32,
    pub last_period_start: Option<NaiveDate>,
    pub notifications_enabled: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CycleSettings {
    /// Settings with the standard 28/5 defaults and no known period start
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
            average_period_length: DEFAULT_PERIOD_LENGTH,
            last_period_start: None,
            notifications_enabled: true,
            updated_at: None,
        }
    }

    /// Check the length domains and the period < cycle invariant
    pub fn validate(&self) -> Result<()> {
        if !CYCLE_LENGTH_RANGE.contains(&self.average_cycle_length) {
            return Err(Error::Validation(format!(
                "cycle length {} outside {}..={} days",
                self.average_cycle_length,
                CYCLE_LENGTH_RANGE.start(),
                CYCLE_LENGTH_RANGE.end()
            )));
        }
        if !PERIOD_LENGTH_RANGE.contains(&self.average_period_length) {
            return Err(Error::Validation(format!(
                "period length {} outside {}..={} days",
                self.average_period_length,
                PERIOD_LENGTH_RANGE.start(),
                PERIOD_LENGTH_RANGE.end()
            )));
        }
        if self.average_period_length >= self.average_cycle_length {
            return Err(Error::Validation(format!(
                "period length {} must be shorter than cycle length {}",
                self.average_period_length, self.average_cycle_length
            )));
        }
        Ok(())
    }

    /// Force stored values back into their domains so reads never fail
    pub fn sanitized(mut self) -> Self {
        if self.validate().is_ok() {
            return self;
        }

        tracing::warn!(
            "Settings for {} out of domain (cycle {}, period {}), clamping",
            self.user_id,
            self.average_cycle_length,
            self.average_period_length
        );

        self.average_cycle_length = self
            .average_cycle_length
            .clamp(*CYCLE_LENGTH_RANGE.start(), *CYCLE_LENGTH_RANGE.end());
        self.average_period_length = self
            .average_period_length
            .clamp(*PERIOD_LENGTH_RANGE.start(), *PERIOD_LENGTH_RANGE.end())
            .min(self.average_cycle_length - 1);
        self
    }
}

/// Partial settings change requested by the user
#[derive(Clone, Debug, Default)]
pub struct SettingsUpdate {
    pub average_cycle_length: Option<u32>,
    pub average_period_length: Option<u32>,
    pub notifications_enabled: Option<bool>,
    pub last_period_start: Option<NaiveDate>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.average_cycle_length.is_none()
            && self.average_period_length.is_none()
            && self.notifications_enabled.is_none()
            && self.last_period_start.is_none()
    }

    /// Apply onto existing settings without validating
    pub fn apply_to(&self, settings: &mut CycleSettings) {
        if let Some(len) = self.average_cycle_length {
            settings.average_cycle_length = len;
        }
        if let Some(len) = self.average_period_length {
            settings.average_period_length = len;
        }
        if let Some(enabled) = self.notifications_enabled {
            settings.notifications_enabled = enabled;
        }
        if let Some(date) = self.last_period_start {
            settings.last_period_start = Some(date);
        }
    }
}

// ============================================================================
// Logged Events
// ============================================================================

/// A logged period (append-only)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodLog {
    pub id: Uuid,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow: Flow,
    pub notes: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl PeriodLog {
    /// Last calendar day covered by this log (the start day when still open)
    pub fn last_day(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.last_day()
    }
}

/// Input for recording a period
#[derive(Clone, Debug)]
pub struct PeriodEntry {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow: Flow,
    pub notes: Option<String>,
}

impl PeriodEntry {
    pub fn starting(start_date: NaiveDate, flow: Flow) -> Self {
        Self {
            start_date,
            end_date: None,
            flow,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(Error::Validation(format!(
                    "period end {} precedes start {}",
                    end, self.start_date
                )));
            }
        }
        Ok(())
    }
}

/// Per-day symptom and flow entry, unique per user and date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyLog {
    pub user_id: String,
    pub date: NaiveDate,
    pub flow: Option<Flow>,
    #[serde(default)]
    pub symptoms: BTreeSet<String>,
    pub notes: Option<String>,
}

impl DailyLog {
    pub fn empty(user_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            flow: None,
            symptoms: BTreeSet::new(),
            notes: None,
        }
    }

    /// Whether the logged flow marks this day as a period day
    pub fn marks_period(&self) -> bool {
        self.flow.is_some_and(Flow::counts_as_period)
    }
}

/// Fields supplied when logging a day; `None` keeps the stored value
#[derive(Clone, Debug, Default)]
pub struct DailyLogUpdate {
    pub flow: Option<Flow>,
    pub symptoms: Option<BTreeSet<String>>,
    pub notes: Option<String>,
}

// ============================================================================
// Derived Values
// ============================================================================

/// Current position in the cycle plus predictions, recomputed on every call
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CycleInfo {
    pub as_of: NaiveDate,
    pub current_phase: Phase,
    pub day_of_cycle: u32,
    pub cycle_length: u32,
    pub next_period_date: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

impl CycleInfo {
    pub fn days_until_next_period(&self) -> i64 {
        (self.next_period_date - self.as_of).num_days()
    }

    pub fn is_in_fertile_window(&self, date: NaiveDate) -> bool {
        date >= self.fertile_window_start && date <= self.fertile_window_end
    }
}

/// Whether a calendar day shows predicted or logged data
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DaySource {
    Predicted,
    Logged,
}

/// One real day of a projected month
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub cycle_day: u32,
    pub phase: Phase,
    pub is_period: bool,
    pub is_fertile: bool,
    pub is_today: bool,
    pub source: DaySource,
    pub log: Option<DailyLog>,
}

/// A cell of the 7-column month grid
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarCell {
    /// Alignment cell before day 1; carries no phase data
    Placeholder,
    Day(CalendarDay),
}

impl CalendarCell {
    /// Day of month, 0 for placeholders
    pub fn day_number(&self) -> u32 {
        match self {
            CalendarCell::Placeholder => 0,
            CalendarCell::Day(day) => day.day,
        }
    }

    pub fn as_day(&self) -> Option<&CalendarDay> {
        match self {
            CalendarCell::Placeholder => None,
            CalendarCell::Day(day) => Some(day),
        }
    }

    pub fn as_day_mut(&mut self) -> Option<&mut CalendarDay> {
        match self {
            CalendarCell::Placeholder => None,
            CalendarCell::Day(day) => Some(day),
        }
    }
}
