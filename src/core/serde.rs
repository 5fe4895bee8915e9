/// Serde helper functions for custom serialization/deserialization
use std::time::SystemTime;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::limits::DATE_FORMAT;

/// Format a timestamp in the fixed `FileInfo.date` layout (UTC)
pub fn format_fixed_date(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(DATE_FORMAT)
        .unwrap_or_default()
}

/// Serialize SystemTime as a fixed-format date string
pub mod fixed_date {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_fixed_date(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let parsed =
            PrimitiveDateTime::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)?;
        Ok(parsed.assume_utc().into())
    }
}
