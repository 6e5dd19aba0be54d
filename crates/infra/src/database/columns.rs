//! Column encoding shared by the SQLite repositories
//!
//! Timestamps are unix milliseconds, ids are hyphenated UUID text and enums
//! use their lowercase storage token.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn opt_to_millis(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(to_millis)
}

pub(crate) fn from_millis(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        conversion_error(idx, Type::Integer, format!("timestamp out of range: {millis}"))
    })
}

pub(crate) fn opt_from_millis(idx: usize, millis: Option<i64>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    millis.map(|value| from_millis(idx, value)).transpose()
}

pub(crate) fn parse_uuid(idx: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|err| conversion_error(idx, Type::Text, err.to_string()))
}

/// Parse an enum storage token.
pub(crate) fn parse_token<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    value.parse::<T>().map_err(|err| conversion_error(idx, Type::Text, err))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn opt_bool_to_int(value: Option<bool>) -> Option<i64> {
    value.map(bool_to_int)
}

pub(crate) fn int_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

pub(crate) fn int_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub(crate) fn u64_to_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn conversion_error(idx: usize, ty: Type, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, message.into())
}
