//! Icecast's fixed timestamp layout.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, de::Error as _};

/// Layout of every `*_iso8601` field, e.g. `2016-01-01T00:00:00+0000`.
pub const ICECAST_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a timestamp in the layout Icecast uses for `*_iso8601` fields.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(value, ICECAST_TIMESTAMP_FORMAT)
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(|e| D::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}
