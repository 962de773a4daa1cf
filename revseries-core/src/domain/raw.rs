//! RawRecord: one unvalidated data point as the histogram source reports it.
//!
//! The source emits timestamps and counts either as JSON integers or as
//! numeric strings. Both are accepted; anything else fails deserialization.
//! A malformed count is never read as zero, since zero is a real value.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// A dated up/down count, weekly or monthly, straight from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "deserialize_i64")]
    pub date: i64,
    #[serde(deserialize_with = "deserialize_u64")]
    pub recommendations_up: u64,
    #[serde(deserialize_with = "deserialize_u64")]
    pub recommendations_down: u64,
}

impl RawRecord {
    pub fn new(date: i64, up: u64, down: u64) -> Self {
        Self {
            date,
            recommendations_up: up,
            recommendations_down: down,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

/// Accept an integer or a numeric string.
pub fn deserialize_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match IntOrString::deserialize(deserializer) {
        Ok(IntOrString::Int(v)) => Ok(v),
        Ok(IntOrString::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| de::Error::custom(format!("invalid integer '{s}': {e}"))),
        Err(_) => Err(de::Error::custom("expected an integer or a numeric string")),
    }
}

/// Accept a non-negative integer or a numeric string.
pub fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_i64(deserializer)?;
    u64::try_from(value).map_err(|_| de::Error::custom(format!("negative count {value}")))
}
