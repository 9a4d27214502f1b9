use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Local;
use log::{error, info, warn};

use super::{CaptureGuard, Frame};
use crate::models::Emotion;

/// Dominant-emotion model.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, frame: &Frame) -> Result<Emotion>;
}

/// Captures one frame and classifies it, degrading to `neutral` instead of failing.
#[derive(Clone)]
pub struct EmotionDetector {
    guard: CaptureGuard,
    classifier: Arc<dyn EmotionClassifier>,
    snapshot_dir: PathBuf,
}

impl EmotionDetector {
    pub fn new(
        guard: CaptureGuard,
        classifier: Arc<dyn EmotionClassifier>,
        snapshot_dir: PathBuf,
    ) -> Self {
        Self {
            guard,
            classifier,
            snapshot_dir,
        }
    }

    pub async fn detect_emotion(&self) -> Emotion {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || detector.detect_blocking())
            .await
            .unwrap_or_else(|err| {
                error!("[Emotion] Detection worker failed: {err}");
                Emotion::Neutral
            })
    }

    pub fn detect_blocking(&self) -> Emotion {
        let frame = match self.guard.grab_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("[Emotion] Failed to capture webcam frame: {err:#}");
                return Emotion::Neutral;
            }
        };

        if let Err(err) = self.save_snapshot(&frame) {
            warn!("[Snapshot] {err:#}");
        }

        let emotion = classify_with_retry(self.classifier.as_ref(), &frame);
        info!("[Emotion] {emotion}");
        emotion
    }

    /// Audit copy of the analysed frame; independent of the classification outcome.
    fn save_snapshot(&self, frame: &Frame) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.snapshot_dir).with_context(|| {
            format!("failed to create {}", self.snapshot_dir.display())
        })?;

        let name = Local::now().format("%Y-%m-%d_%H-%M-%S.jpg").to_string();
        let path = self.snapshot_dir.join(name);
        // JPEG has no alpha channel.
        frame
            .to_rgb8()
            .save(&path)
            .with_context(|| format!("failed to save {}", path.display()))?;

        info!("[Snapshot] Saved: {}", path.display());
        Ok(path)
    }
}

/// Classifies `frame`, retrying once on a grayscale copy, then settling on neutral.
pub fn classify_with_retry(classifier: &dyn EmotionClassifier, frame: &Frame) -> Emotion {
    match classifier.classify(frame) {
        Ok(emotion) => emotion,
        Err(err) => {
            warn!("[Emotion] Primary analysis failed, trying grayscale: {err:#}");
            match classifier.classify(&frame.grayscale()) {
                Ok(emotion) => emotion,
                Err(err) => {
                    error!("[Emotion] Grayscale analysis failed: {err:#}");
                    Emotion::Neutral
                }
            }
        }
    }
}
