//! Domain types for revseries

pub mod calendar;
pub mod raw;
pub mod record;

pub use calendar::{month_start_of, month_start_timestamp, Calendar, DEFAULT_ORIGIN};
pub use raw::RawRecord;
pub use record::MonthlyRecord;
