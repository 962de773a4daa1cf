//! Cadence detection for raw series.

use serde::{Deserialize, Serialize};

use crate::domain::RawRecord;

/// Seconds in seven days.
pub const WEEK_SECONDS: i64 = 7 * 86_400;

/// Reporting interval of a raw series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Monthly,
    Weekly,
}

/// Classify a chronologically ordered series.
///
/// Weekly only when every gap between adjacent records is exactly seven
/// days. Series with fewer than two records have no gaps and count as
/// monthly. A history that switches cadence partway through is treated as
/// monthly as a whole.
pub fn classify(records: &[RawRecord]) -> Cadence {
    if records.len() < 2 {
        return Cadence::Monthly;
    }
    let all_weekly = records
        .windows(2)
        .all(|pair| pair[1].date.checked_sub(pair[0].date) == Some(WEEK_SECONDS));
    if all_weekly {
        Cadence::Weekly
    } else {
        Cadence::Monthly
    }
}
