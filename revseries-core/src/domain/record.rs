//! MonthlyRecord: one calendar month of up/down review counts.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::calendar::Calendar;
use crate::error::SeriesError;

/// Up/down review counts attributed to a single calendar month.
///
/// The period is always a calendar month start: constructors floor arbitrary
/// timestamps onto the calendar. Records are never mutated; merging two
/// records yields a new one.
///
/// Period identity is [`MonthlyRecord::equals_period`], which ignores the
/// counts. The derived `PartialEq` compares every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyRecord {
    #[serde(with = "chrono::serde::ts_seconds")]
    period: DateTime<Utc>,
    up: u64,
    down: u64,
}

impl MonthlyRecord {
    /// Build a record, flooring `timestamp` onto the calendar.
    pub fn new(timestamp: i64, up: u64, down: u64, calendar: &Calendar) -> Result<Self, SeriesError> {
        let period = calendar.floor_instant(timestamp)?;
        Ok(Self { period, up, down })
    }

    /// Zero-count record for a month with no data.
    pub(crate) fn empty(period: DateTime<Utc>) -> Self {
        Self::at(period, 0, 0)
    }

    /// Record for a period already known to be a calendar month start.
    pub(crate) fn at(period: DateTime<Utc>, up: u64, down: u64) -> Self {
        Self { period, up, down }
    }

    /// Month start as a Unix timestamp.
    pub fn period(&self) -> i64 {
        self.period.timestamp()
    }

    pub fn period_start(&self) -> DateTime<Utc> {
        self.period
    }

    pub fn up(&self) -> u64 {
        self.up
    }

    pub fn down(&self) -> u64 {
        self.down
    }

    /// Up plus down, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.up.saturating_add(self.down)
    }

    /// Percentage of positive reviews, `None` for a month without reviews.
    pub fn score(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.up as f64 / total as f64 * 100.0),
        }
    }

    pub fn year(&self) -> i32 {
        self.period.year()
    }

    pub fn month(&self) -> u32 {
        self.period.month()
    }

    /// True when both records belong to the same month, whatever their counts.
    pub fn equals_period(&self, other: &Self) -> bool {
        self.period == other.period
    }

    /// Chronological order of the two periods.
    pub fn compare_period(&self, other: &Self) -> Ordering {
        self.period.cmp(&other.period)
    }

    /// Sum the counts of two records for the same month.
    pub fn merge_same_period(&self, other: &Self) -> Result<Self, SeriesError> {
        if !self.equals_period(other) {
            return Err(SeriesError::InvalidMerge {
                left: self.period(),
                right: other.period(),
            });
        }
        let overflow = || SeriesError::CountOverflow {
            period: self.period(),
        };
        Ok(Self {
            period: self.period,
            up: self.up.checked_add(other.up).ok_or_else(overflow)?,
            down: self.down.checked_add(other.down).ok_or_else(overflow)?,
        })
    }
}
