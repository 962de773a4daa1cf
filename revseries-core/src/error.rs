//! Structured error types for series normalization.
//!
//! Every variant is local to one product's normalization. Callers running a
//! batch decide whether to skip the product or abort the run.

use thiserror::Error;

/// Errors raised while building the calendar or normalizing a series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("timestamp {timestamp} predates the calendar origin {origin}")]
    OutOfRange { timestamp: i64, origin: i64 },

    #[error("week starting at {start} has no month transition within six days")]
    MalformedWeek { start: i64 },

    #[error("cannot merge records for different periods ({left} and {right})")]
    InvalidMerge { left: i64, right: i64 },

    #[error("timestamp {0} is outside the representable date range")]
    InvalidTimestamp(i64),

    #[error("calendar origin {0} is not midnight UTC on the 1st of a month")]
    InvalidOrigin(i64),

    #[error("{year}-{month:02} is not a valid calendar month")]
    InvalidMonth { year: i32, month: u32 },

    #[error("review counts for period {period} exceed the u64 range")]
    CountOverflow { period: i64 },
}
