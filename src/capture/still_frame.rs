use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{bail, Context, Result};

use super::{CaptureDevice, Frame};

/// Capture device backed by an image file that an external grabber keeps current.
///
/// A missing file reads as an unavailable camera. Only one lease may be open.
pub struct StillFrameDevice {
    path: PathBuf,
    opened: AtomicBool,
}

impl StillFrameDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            opened: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CaptureDevice for StillFrameDevice {
    fn open(&self) -> Result<()> {
        if !self.path.is_file() {
            bail!("no frame published at {}", self.path.display());
        }
        if self.opened.swap(true, Ordering::SeqCst) {
            bail!("capture device already open");
        }
        Ok(())
    }

    fn read_frame(&self) -> Result<Frame> {
        if !self.opened.load(Ordering::SeqCst) {
            bail!("capture device is not open");
        }
        image::open(&self.path).with_context(|| format!("failed to decode {}", self.path.display()))
    }

    fn release(&self) {
        self.opened.store(false, Ordering::SeqCst);
    }
}
