use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{timestamp, ActivitySnapshot, Emotion, UserStateSnapshot};

/// One completed detection cycle as written to the event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub emotion: Emotion,
    pub activity: ActivitySnapshot,
    pub quote: String,
}

impl LogEntry {
    pub fn from_snapshot(snapshot: UserStateSnapshot, quote: String) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            emotion: snapshot.emotion,
            activity: snapshot.activity,
            quote,
        }
    }
}
