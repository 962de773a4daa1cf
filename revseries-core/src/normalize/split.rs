//! Week splitting: apportion one weekly record across the months it touches.
//!
//! A week starting at T covers days T..=T+6. When those seven days straddle
//! a month boundary, counts are divided by day overlap: `d` days stay in T's
//! month and `7 - d` move to the next. Each field is rounded independently,
//! so the two halves may differ from the original total by one.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::domain::calendar::to_instant;
use crate::domain::{Calendar, MonthlyRecord, RawRecord};
use crate::error::SeriesError;

const DAYS_PER_WEEK: u64 = 7;

/// Split a weekly record into its month-aligned parts.
///
/// Returns the full record and `None` when the week sits inside one month.
pub fn split_week(
    record: &RawRecord,
    calendar: &Calendar,
) -> Result<(MonthlyRecord, Option<MonthlyRecord>), SeriesError> {
    let up = record.recommendations_up;
    let down = record.recommendations_down;
    let start = to_instant(record.date)?;

    if same_month(start, day_offset(start, 6)?) {
        let whole = MonthlyRecord::new(record.date, up, down, calendar)?;
        return Ok((whole, None));
    }

    // Day 6 is already in another month, so a change day exists unless the
    // calendar arithmetic itself is inconsistent.
    let days_before =
        change_day(start)?.ok_or(SeriesError::MalformedWeek { start: record.date })?;
    let days_after = DAYS_PER_WEEK - days_before as u64;

    let first = MonthlyRecord::new(
        record.date,
        apportion(up, days_before as u64),
        apportion(down, days_before as u64),
        calendar,
    )?;
    let second = MonthlyRecord::new(
        day_offset(start, days_before)?.timestamp(),
        apportion(up, days_after),
        apportion(down, days_after),
        calendar,
    )?;

    Ok((first, Some(second)))
}

/// `round(count * days / 7)` in integer arithmetic.
///
/// `count * days / 7` is never exactly half-way between two integers (that
/// would need `2 * count * days` to be an odd multiple of 7 while `count * days`
/// is a multiple of 7), so half-up rounding here matches any rounding mode.
fn apportion(count: u64, days: u64) -> u64 {
    let scaled = 2 * u128::from(count) * u128::from(days) + u128::from(DAYS_PER_WEEK);
    (scaled / (2 * u128::from(DAYS_PER_WEEK))) as u64
}

/// First offset in `1..=6` whose day falls outside `start`'s month.
fn change_day(start: DateTime<Utc>) -> Result<Option<i64>, SeriesError> {
    for offset in 1..=6 {
        if !same_month(start, day_offset(start, offset)?) {
            return Ok(Some(offset));
        }
    }
    Ok(None)
}

fn same_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn day_offset(start: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, SeriesError> {
    start
        .checked_add_signed(Duration::days(days))
        .ok_or(SeriesError::InvalidTimestamp(start.timestamp()))
}
