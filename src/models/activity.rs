use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{timestamp, Emotion};

/// Per-second input rates over the window since the previous snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivitySnapshot {
    /// Keys per second.
    pub typing_speed: f64,
    /// Pointer travel in pixels per second.
    pub mouse_speed: f64,
    pub active_window: String,
}

impl ActivitySnapshot {
    /// Context used when no real activity sample is available.
    pub fn idle(active_window: impl Into<String>) -> Self {
        Self {
            typing_speed: 0.0,
            mouse_speed: 0.0,
            active_window: active_window.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStateSnapshot {
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub emotion: Emotion,
    pub activity: ActivitySnapshot,
}

impl UserStateSnapshot {
    pub fn new(emotion: Emotion, activity: ActivitySnapshot) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            emotion,
            activity,
        }
    }
}
