//! Normalization of raw review histories into calendar-aligned monthly series.
//!
//! Flow per product: [`classify`] picks the cadence. Monthly series are
//! matched against the calendar directly; weekly series go through
//! [`split_week`] and are merged by month. Both paths end zero-filled, one
//! record per calendar month. [`resolve_start`] handles the start marker
//! separately.

pub mod classify;
pub mod series;
pub mod split;
pub mod start;

pub use classify::{classify, Cadence, WEEK_SECONDS};
pub use series::{normalize, normalize_with_cadence, NormalizeOutcome, NormalizedSeries};
pub use split::split_week;
pub use start::resolve_start;
