//! revseries core: calendar, monthly records and series normalization.
//!
//! This crate turns per-product review histories into one uniform shape:
//! - Calendar of month starts shared by every product in a run
//! - Monthly records with period identity and additive merge
//! - Cadence detection (weekly vs monthly)
//! - Day-proportional splitting of weeks that straddle two months
//! - Gap-filled, ascending monthly series
//! - Review-start resolution onto the calendar
//!
//! Everything here is pure and synchronous. I/O lives in `revseries-runner`.

pub mod domain;
pub mod error;
pub mod normalize;

pub use domain::{Calendar, MonthlyRecord, RawRecord};
pub use error::SeriesError;
pub use normalize::{
    classify, normalize, normalize_with_cadence, resolve_start, split_week, Cadence,
    NormalizeOutcome, NormalizedSeries,
};
