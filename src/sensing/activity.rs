use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Instant,
};

use anyhow::Result;
use log::{info, warn};

use crate::models::ActivitySnapshot;

const MIN_WINDOW_SECS: f64 = 1.0;

/// Title of the window that currently has keyboard focus.
pub trait WindowTitleSource: Send + Sync {
    fn foreground_title(&self) -> Result<String>;
}

/// Used on platforms without a foreground-window lookup; snapshots report "Unknown".
#[derive(Debug, Default)]
pub struct NoWindowTitles;

impl WindowTitleSource for NoWindowTitles {
    fn foreground_title(&self) -> Result<String> {
        anyhow::bail!("foreground window lookup is not available on this platform")
    }
}

#[derive(Debug)]
struct ActivityWindow {
    key_count: u64,
    distance: f64,
    started: Instant,
    /// Survives resets so travel across a snapshot boundary is still counted.
    last_position: Option<(f64, f64)>,
}

impl ActivityWindow {
    fn new(started: Instant) -> Self {
        Self {
            key_count: 0,
            distance: 0.0,
            started,
            last_position: None,
        }
    }
}

/// Accumulates keystrokes and pointer travel between snapshots.
pub struct ActivitySampler {
    window: Mutex<ActivityWindow>,
    titles: Arc<dyn WindowTitleSource>,
}

impl ActivitySampler {
    pub fn new(titles: Arc<dyn WindowTitleSource>) -> Self {
        Self {
            window: Mutex::new(ActivityWindow::new(Instant::now())),
            titles,
        }
    }

    pub fn record_keypress(&self) {
        self.lock().key_count += 1;
    }

    pub fn record_pointer_move(&self, x: f64, y: f64) {
        let mut window = self.lock();
        if let Some((last_x, last_y)) = window.last_position {
            window.distance += (x - last_x).hypot(y - last_y);
        }
        window.last_position = Some((x, y));
    }

    pub fn snapshot_and_reset(&self) -> ActivitySnapshot {
        self.snapshot_and_reset_at(Instant::now())
    }

    /// Computes rates for the window ending at `now` and starts a new window there.
    pub fn snapshot_and_reset_at(&self, now: Instant) -> ActivitySnapshot {
        let active_window = self.active_window();

        let (keys, distance, elapsed) = {
            let mut window = self.lock();
            let elapsed = now
                .saturating_duration_since(window.started)
                .as_secs_f64()
                .max(MIN_WINDOW_SECS);
            let sample = (window.key_count, window.distance, elapsed);

            window.key_count = 0;
            window.distance = 0.0;
            window.started = now;
            sample
        };

        let snapshot = ActivitySnapshot {
            typing_speed: round2(keys as f64 / elapsed),
            mouse_speed: round2(distance / elapsed),
            active_window,
        };
        info!("[Activity] Snapshot: {snapshot:?}");
        snapshot
    }

    /// Keystrokes and pointer distance recorded since the last snapshot.
    pub fn pending(&self) -> (u64, f64) {
        let window = self.lock();
        (window.key_count, window.distance)
    }

    fn active_window(&self) -> String {
        match self.titles.foreground_title() {
            Ok(title) if title.trim().is_empty() => "Untitled".into(),
            Ok(title) => title,
            Err(err) => {
                warn!("[Window] Error retrieving active window: {err}");
                "Unknown".into()
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ActivityWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
