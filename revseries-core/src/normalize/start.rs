//! Review-start resolution.

use crate::domain::Calendar;
use crate::error::SeriesError;

/// Map a product's review-start marker onto the calendar.
///
/// A marker that is already a month start is returned unchanged; anything
/// else resolves to the latest month start before it. Markers older than
/// the calendar origin are a data-quality problem and fail with
/// [`SeriesError::OutOfRange`].
pub fn resolve_start(timestamp: i64, calendar: &Calendar) -> Result<i64, SeriesError> {
    if calendar.contains(timestamp) {
        return Ok(timestamp);
    }
    calendar.floor(timestamp)
}
