use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};

use super::{CaptureDevice, DeviceLease, FaceDetector, Frame};
use crate::sensing::processes::{find_matching_process, ProcessSource};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Process-name fragments of known video-call applications.
pub const VIDEO_CALL_APPS: [&str; 6] = ["zoom", "teams", "skype", "meet", "webex", "discord"];

/// Serializes access to the capture device and answers the pre-cycle gate questions.
#[derive(Clone)]
pub struct CaptureGuard {
    device: Arc<dyn CaptureDevice>,
    device_lock: Arc<Mutex<()>>,
    processes: Arc<dyn ProcessSource>,
    faces: Arc<dyn FaceDetector>,
}

impl CaptureGuard {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        processes: Arc<dyn ProcessSource>,
        faces: Arc<dyn FaceDetector>,
    ) -> Self {
        Self {
            device,
            device_lock: Arc::new(Mutex::new(())),
            processes,
            faces,
        }
    }

    /// Opens the device, reads one frame and releases it, all under the device lock.
    pub fn grab_frame(&self) -> Result<Frame> {
        let _device = self
            .device_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let lease =
            DeviceLease::open(self.device.as_ref()).context("capture device could not be opened")?;
        let frame = lease
            .read_frame()
            .context("capture device returned no frame")?;
        Ok(frame)
    }

    /// True when the camera is busy, or when it is free but a video-call app is running.
    /// Indeterminate failures report false.
    pub async fn is_video_conference_active(&self) -> bool {
        let guard = self.clone();
        match tokio::task::spawn_blocking(move || guard.check_video_conference()).await {
            Ok(Ok(active)) => active,
            Ok(Err(err)) => {
                log_error!("Video call check failed: {err:#}");
                false
            }
            Err(err) => {
                log_error!("Video call check worker failed: {err}");
                false
            }
        }
    }

    pub fn check_video_conference(&self) -> Result<bool> {
        let names = self
            .processes
            .process_names()
            .context("failed to list running processes")?;
        let call_app = find_matching_process(&names, &VIDEO_CALL_APPS);
        if let Some(app) = call_app {
            log_info!("Video conferencing app running: {app}");
        }

        match self.grab_frame() {
            Ok(_) => {
                log_info!("Camera available");
                Ok(call_app.is_some())
            }
            Err(err) => {
                log_info!("Camera busy: {err:#}");
                Ok(true)
            }
        }
    }

    pub async fn is_face_found(&self) -> bool {
        let guard = self.clone();
        tokio::task::spawn_blocking(move || guard.check_face())
            .await
            .unwrap_or_else(|err| {
                log_error!("Face check worker failed: {err}");
                false
            })
    }

    pub fn check_face(&self) -> bool {
        let frame = match self.grab_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log_warn!("Couldn't access webcam: {err:#}");
                return false;
            }
        };

        match self.faces.count_faces(&frame) {
            Ok(count) => {
                log_info!("Face detection: {count} face(s)");
                count > 0
            }
            Err(err) => {
                log_warn!("Face detection failed: {err:#}");
                false
            }
        }
    }
}
