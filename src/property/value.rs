//! Typed property values.

use chrono::{DateTime, Utc};

use super::tag::PropType;

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_EPOCH_OFFSET: i64 = 11_644_473_600;

/// FILETIME ticks per second.
const TICKS_PER_SECOND: i64 = 10_000_000;

/// The value half of a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Long(i32),
    Boolean(bool),
    Long64(i64),
    String(String),
    Time(DateTime<Utc>),
    Binary(Vec<u8>),
}

impl PropValue {
    /// The type this value can be stored as.
    pub fn prop_type(&self) -> PropType {
        match self {
            PropValue::Long(_) => PropType::Long,
            PropValue::Boolean(_) => PropType::Boolean,
            PropValue::Long64(_) => PropType::Long64,
            PropValue::String(_) => PropType::Unicode,
            PropValue::Time(_) => PropType::SysTime,
            PropValue::Binary(_) => PropType::Binary,
        }
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Long(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Boolean(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Long64(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::String(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::String(v)
    }
}

impl From<DateTime<Utc>> for PropValue {
    fn from(v: DateTime<Utc>) -> Self {
        PropValue::Time(v)
    }
}

impl From<Vec<u8>> for PropValue {
    fn from(v: Vec<u8>) -> Self {
        PropValue::Binary(v)
    }
}

/// Convert a UTC instant to a FILETIME tick count.
///
/// Instants before 1601 clamp to zero.
pub fn to_filetime(t: &DateTime<Utc>) -> u64 {
    let secs = t.timestamp() + FILETIME_EPOCH_OFFSET;
    if secs < 0 {
        return 0;
    }
    let ticks = secs as i128 * TICKS_PER_SECOND as i128
        + (t.timestamp_subsec_nanos() / 100) as i128;
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// Encode a string as UTF-16LE without a terminator.
pub fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}
