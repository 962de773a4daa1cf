//! Product rows as the histogram fetcher persists them, and their normalized form.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use revseries_core::domain::raw::deserialize_i64;
use revseries_core::{Cadence, NormalizedSeries, RawRecord};

/// Placeholder the fetcher writes for products it has not reached yet.
pub const PENDING_SENTINEL: &str = "Unknown";

/// A product's raw review history, one row of the fetcher's output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductHistory {
    #[serde(deserialize_with = "deserialize_appid")]
    pub appid: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Earliest review timestamp reported by the source.
    #[serde(deserialize_with = "deserialize_i64")]
    pub review_start: i64,

    #[serde(deserialize_with = "deserialize_time_series")]
    pub time_series: TimeSeries,
}

/// Raw series state for a product.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSeries {
    Fetched(Vec<RawRecord>),
    /// The fetcher has not filled this row in yet.
    Pending,
}

impl ProductHistory {
    /// Raw records, or `None` while the row is still pending.
    pub fn records(&self) -> Option<&[RawRecord]> {
        match &self.time_series {
            TimeSeries::Fetched(records) => Some(records),
            TimeSeries::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.time_series, TimeSeries::Pending)
    }
}

/// A product after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedProduct {
    pub appid: String,
    pub name: Option<String>,
    /// Resolved onto the calendar.
    pub review_start: i64,
    pub cadence: Cadence,
    #[serde(skip)]
    pub dropped: usize,
    pub time_series: NormalizedSeries,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AppId {
    Int(u64),
    Str(String),
}

fn deserialize_appid<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match AppId::deserialize(deserializer) {
        Ok(AppId::Int(id)) => Ok(id.to_string()),
        Ok(AppId::Str(id)) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        Ok(AppId::Str(_)) => Err(de::Error::custom("appid is empty")),
        Err(_) => Err(de::Error::custom("appid must be an integer or a string")),
    }
}

fn deserialize_time_series<'de, D>(deserializer: D) -> Result<TimeSeries, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if s == PENDING_SENTINEL => Ok(TimeSeries::Pending),
        serde_json::Value::String(s) => Err(de::Error::custom(format!(
            "unexpected time_series marker '{s}'"
        ))),
        other => serde_json::from_value::<Vec<RawRecord>>(other)
            .map(TimeSeries::Fetched)
            .map_err(de::Error::custom),
    }
}
