//! Series normalization: classify, split, merge and gap-fill onto the calendar.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use super::classify::{classify, Cadence};
use super::split::split_week;
use crate::domain::{Calendar, MonthlyRecord, RawRecord};
use crate::error::SeriesError;

/// Gap-free monthly series, one record per calendar month, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedSeries {
    records: Vec<MonthlyRecord>,
}

impl NormalizedSeries {
    pub fn records(&self) -> &[MonthlyRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonthlyRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<MonthlyRecord> {
        self.records
    }

    /// Record for the month starting at `period`.
    pub fn get(&self, period: i64) -> Option<&MonthlyRecord> {
        self.records
            .binary_search_by_key(&period, |r| r.period())
            .ok()
            .map(|i| &self.records[i])
    }

    /// Months on or after `start`, typically a resolved review start.
    pub fn since(&self, start: i64) -> NormalizedSeries {
        let from = self.records.partition_point(|r| r.period() < start);
        NormalizedSeries {
            records: self.records[from..].to_vec(),
        }
    }

    /// Totals saturate at `u64::MAX`.
    pub fn total_up(&self) -> u64 {
        self.records
            .iter()
            .map(MonthlyRecord::up)
            .fold(0, u64::saturating_add)
    }

    pub fn total_down(&self) -> u64 {
        self.records
            .iter()
            .map(MonthlyRecord::down)
            .fold(0, u64::saturating_add)
    }

    pub fn total_reviews(&self) -> u64 {
        self.total_up().saturating_add(self.total_down())
    }
}

impl<'a> IntoIterator for &'a NormalizedSeries {
    type Item = &'a MonthlyRecord;
    type IntoIter = std::slice::Iter<'a, MonthlyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Normalized series plus what was learned while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub series: NormalizedSeries,
    pub cadence: Cadence,
    /// Monthly-path records whose date was not a calendar month start.
    pub dropped: usize,
}

/// Normalize one product's raw series onto the calendar.
pub fn normalize(
    records: &[RawRecord],
    calendar: &Calendar,
) -> Result<NormalizedSeries, SeriesError> {
    normalize_with_cadence(records, calendar).map(|outcome| outcome.series)
}

/// Like [`normalize`], also reporting the detected cadence and dropped records.
pub fn normalize_with_cadence(
    records: &[RawRecord],
    calendar: &Calendar,
) -> Result<NormalizeOutcome, SeriesError> {
    let cadence = classify(records);
    let (series, dropped) = match cadence {
        Cadence::Monthly => fill_monthly(records, calendar),
        Cadence::Weekly => (merge_weekly(records, calendar)?, 0),
    };
    debug!(
        ?cadence,
        raw = records.len(),
        months = series.len(),
        dropped,
        "normalized series"
    );
    Ok(NormalizeOutcome {
        series,
        cadence,
        dropped,
    })
}

/// Monthly path: take records that sit exactly on a calendar month, zero the rest.
///
/// Records dated anywhere else are dropped, not floored.
fn fill_monthly(records: &[RawRecord], calendar: &Calendar) -> (NormalizedSeries, usize) {
    let mut by_period: HashMap<i64, &RawRecord> = HashMap::with_capacity(records.len());
    let mut dropped = 0;
    for raw in records {
        if calendar.contains(raw.date) {
            // first occurrence wins
            by_period.entry(raw.date).or_insert(raw);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!(
            dropped,
            total = records.len(),
            "monthly series has records off the calendar; dropping them"
        );
    }

    let records = calendar
        .instants()
        .iter()
        .map(|&month| match by_period.get(&month.timestamp()) {
            Some(raw) => MonthlyRecord::at(month, raw.recommendations_up, raw.recommendations_down),
            None => MonthlyRecord::empty(month),
        })
        .collect();

    (NormalizedSeries { records }, dropped)
}

/// Weekly path: split every week, sum parts per month, then zero-fill.
fn merge_weekly(
    records: &[RawRecord],
    calendar: &Calendar,
) -> Result<NormalizedSeries, SeriesError> {
    let mut working: BTreeMap<i64, MonthlyRecord> = BTreeMap::new();

    for raw in records {
        let (first, second) = split_week(raw, calendar)?;
        for part in std::iter::once(first).chain(second) {
            let merged = match working.get(&part.period()) {
                Some(existing) => existing.merge_same_period(&part)?,
                None => part,
            };
            working.insert(merged.period(), merged);
        }
    }

    for &month in calendar.instants() {
        working
            .entry(month.timestamp())
            .or_insert_with(|| MonthlyRecord::empty(month));
    }

    Ok(NormalizedSeries {
        records: working.into_values().collect(),
    })
}
