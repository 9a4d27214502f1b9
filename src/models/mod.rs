mod activity;
mod emotion;
mod log_entry;
mod quote;

pub use activity::{ActivitySnapshot, UserStateSnapshot};
pub use emotion::Emotion;
pub use log_entry::LogEntry;
pub use quote::{QuoteRecord, UserQuote};

/// Serde adapter for local wall-clock timestamps (`2024-05-01 09:30:00`).
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
