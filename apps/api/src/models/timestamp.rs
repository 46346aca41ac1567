//! Serde adapter that renders `DateTime<Utc>` as a document-store timestamp,
//! `{"_seconds": 1700000000, "_nanoseconds": 0}`. Every endpoint uses this one shape.

use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
struct WireTimestamp {
    #[serde(rename = "_seconds")]
    seconds: i64,
    #[serde(rename = "_nanoseconds")]
    nanoseconds: u32,
}

pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    WireTimestamp {
        seconds: ts.timestamp(),
        nanoseconds: ts.timestamp_subsec_nanos(),
    }
    .serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let wire = WireTimestamp::deserialize(deserializer)?;
    DateTime::from_timestamp(wire.seconds, wire.nanoseconds)
        .ok_or_else(|| D::Error::custom("timestamp out of range"))
}
