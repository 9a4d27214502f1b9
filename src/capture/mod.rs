pub mod analyzer;
pub mod emotion;
pub mod guard;
pub mod still_frame;

pub use analyzer::{CommandAnalyzer, UnconfiguredAnalyzer};
pub use emotion::{EmotionClassifier, EmotionDetector};
pub use guard::{CaptureGuard, VIDEO_CALL_APPS};
pub use still_frame::StillFrameDevice;

use anyhow::Result;

pub type Frame = image::DynamicImage;

/// Exclusive video input (a webcam or something standing in for one).
///
/// Callers go through [`DeviceLease`] so every successful `open` is paired
/// with a `release`.
pub trait CaptureDevice: Send + Sync {
    fn open(&self) -> Result<()>;
    fn read_frame(&self) -> Result<Frame>;
    fn release(&self);
}

/// Counts face regions in a frame.
pub trait FaceDetector: Send + Sync {
    fn count_faces(&self, frame: &Frame) -> Result<usize>;
}

/// An opened capture device, released when dropped.
pub struct DeviceLease<'a> {
    device: &'a dyn CaptureDevice,
}

impl<'a> DeviceLease<'a> {
    pub fn open(device: &'a dyn CaptureDevice) -> Result<Self> {
        device.open()?;
        Ok(Self { device })
    }

    pub fn read_frame(&self) -> Result<Frame> {
        self.device.read_frame()
    }
}

impl Drop for DeviceLease<'_> {
    fn drop(&mut self) {
        self.device.release();
    }
}
