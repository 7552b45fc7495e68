//! Wire format for local date-times such as performance start and end
//! times: `2025-07-14T20:00:00`, with no offset.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

const OUTPUT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

const INPUTS: &[&[FormatItem<'static>]] = &[
    OUTPUT,
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
];

/// Formats a local date-time for the wire.
///
/// ```
/// use festival::datetime::format;
/// use time::macros::datetime;
///
/// assert_eq!(format(&datetime!(2025-07-14 20:00)), "2025-07-14T20:00:00");
/// ```
pub fn format(value: &PrimitiveDateTime) -> String {
    value
        .format(OUTPUT)
        .unwrap_or_else(|_| value.to_string())
}

/// Parses a local date-time, with or without seconds and fractional
/// seconds.
pub fn parse(raw: &str) -> Option<PrimitiveDateTime> {
    INPUTS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(raw.trim(), format).ok())
}

pub fn serialize<S>(value: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where S: Serializer {
    serializer.serialize_str(&format(value))
}

/// Deserializes an optional local date-time. A missing or `null` value
/// becomes `None`; anything else must parse.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<PrimitiveDateTime>, D::Error>
where D: Deserializer<'de> {
    use serde::de::Error;

    let raw: Option<String> = Deserialize::deserialize(deserializer)?;

    match raw {
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date-time {:?}", raw))),
        None => Ok(None),
    }
}
