// Integers that arrive either as JSON numbers or wrapped in quotes.
//
// Depending on the firmware release the controllers emit the same counter
// as `42` or `"42"`. Fields opt in with
// `#[serde(default, deserialize_with = "quoted::uint")]`; `null` decodes
// to zero. `opt_uint` keeps absent and `null` apart from zero.

use std::num::ParseIntError;

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Quoted {
    Signed(i64),
    Unsigned(u64),
    Text(String),
}

/// Parse a numeric-as-string value. Shared by the serde helpers below and
/// by fields that must be parsed after decoding (e.g. registration
/// timestamps, where a failure is a hard error for the collection).
pub fn parse_int(raw: &str) -> Result<i64, ParseIntError> {
    raw.trim().parse()
}

fn decode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Option::<Quoted>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Quoted::Signed(v)) => Ok(v),
        Some(Quoted::Unsigned(v)) => i64::try_from(v).map_err(D::Error::custom),
        Some(Quoted::Text(s)) => parse_int(&s)
            .map_err(|e| D::Error::custom(format!("invalid quoted integer {s:?}: {e}"))),
    }
}

pub(crate) fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    decode(deserializer)
}

pub(crate) fn uint<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let v = decode(deserializer)?;
    u64::try_from(v).map_err(|_| D::Error::custom(format!("negative value {v} for counter")))
}

pub(crate) fn opt_uint<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    match Option::<Quoted>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Quoted::Unsigned(v)) => Ok(Some(v)),
        Some(Quoted::Signed(v)) => u64::try_from(v)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("negative value {v} for counter"))),
        Some(Quoted::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid quoted integer {s:?}: {e}"))),
    }
}
