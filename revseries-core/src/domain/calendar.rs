//! Calendar: the shared monthly timeline every series is aligned to.
//!
//! A calendar is a strictly increasing list of month-start instants
//! (midnight UTC on the 1st), from a fixed origin through the month
//! containing `now`. It is built once per run and passed by reference to
//! every normalization, so all products in a run floor against the same
//! snapshot even if the run crosses a month boundary.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::error::SeriesError;

/// 2010-10-01T00:00:00Z, the earliest month any review history reaches.
pub const DEFAULT_ORIGIN: i64 = 1_285_891_200;

/// Immutable, strictly increasing sequence of month-start instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    months: Vec<DateTime<Utc>>,
}

impl Calendar {
    /// Build the calendar from `origin` through the month containing `now`, inclusive.
    ///
    /// `origin` must itself be a month start. A `now` earlier than the origin
    /// is reported as [`SeriesError::OutOfRange`].
    pub fn generate(origin: i64, now: DateTime<Utc>) -> Result<Self, SeriesError> {
        let start = to_instant(origin)?;
        if start.day() != 1 || start.num_seconds_from_midnight() != 0 {
            return Err(SeriesError::InvalidOrigin(origin));
        }
        if now < start {
            return Err(SeriesError::OutOfRange {
                timestamp: now.timestamp(),
                origin,
            });
        }

        let end = (now.year(), now.month());
        let (mut year, mut month) = (start.year(), start.month());
        let mut months = Vec::new();

        while (year, month) <= end {
            months.push(month_start(year, month)?);
            (year, month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
        }

        Ok(Self { months })
    }

    /// Calendar from the default origin through the current month.
    pub fn current() -> Result<Self, SeriesError> {
        Self::generate(DEFAULT_ORIGIN, Utc::now())
    }

    /// First month of the calendar.
    pub fn origin(&self) -> i64 {
        self.months[0].timestamp()
    }

    /// Last (current) month of the calendar.
    pub fn last(&self) -> i64 {
        self.months[self.months.len() - 1].timestamp()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    /// Always false: a generated calendar holds at least the origin month.
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Month starts as Unix timestamps, ascending.
    pub fn months(&self) -> impl Iterator<Item = i64> + '_ {
        self.months.iter().map(|m| m.timestamp())
    }

    pub(crate) fn instants(&self) -> &[DateTime<Utc>] {
        &self.months
    }

    /// Exact membership: is `timestamp` one of the month starts?
    pub fn contains(&self, timestamp: i64) -> bool {
        self.index_of(timestamp).is_some()
    }

    /// Position of `timestamp` in the calendar, if it is a month start.
    pub fn index_of(&self, timestamp: i64) -> Option<usize> {
        self.months
            .binary_search_by_key(&timestamp, |m| m.timestamp())
            .ok()
    }

    /// Latest month start that is `<= timestamp`.
    pub fn floor(&self, timestamp: i64) -> Result<i64, SeriesError> {
        self.floor_instant(timestamp).map(|m| m.timestamp())
    }

    pub(crate) fn floor_instant(&self, timestamp: i64) -> Result<DateTime<Utc>, SeriesError> {
        // Count of months at or before the timestamp; zero means it predates the origin.
        let idx = self.months.partition_point(|m| m.timestamp() <= timestamp);
        if idx == 0 {
            return Err(SeriesError::OutOfRange {
                timestamp,
                origin: self.origin(),
            });
        }
        Ok(self.months[idx - 1])
    }

    /// Number of calendar months in the closed range `[from, to]`.
    pub fn months_between(&self, from: i64, to: i64) -> usize {
        if from > to {
            return 0;
        }
        let lo = self.months.partition_point(|m| m.timestamp() < from);
        let hi = self.months.partition_point(|m| m.timestamp() <= to);
        hi - lo
    }
}

/// Midnight UTC on the 1st of `year`-`month`, as a Unix timestamp.
pub fn month_start_timestamp(year: i32, month: u32) -> Result<i64, SeriesError> {
    month_start(year, month).map(|m| m.timestamp())
}

/// Month start for a calendar date's month, used when origins come from config.
pub fn month_start_of(date: NaiveDate) -> Result<i64, SeriesError> {
    month_start_timestamp(date.year(), date.month())
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>, SeriesError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or(SeriesError::InvalidMonth { year, month })
}

pub(crate) fn to_instant(timestamp: i64) -> Result<DateTime<Utc>, SeriesError> {
    DateTime::from_timestamp(timestamp, 0).ok_or(SeriesError::InvalidTimestamp(timestamp))
}
