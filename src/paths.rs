use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const DATA_DIR_ENV: &str = "VIBESYNC_DATA_DIR";

/// On-disk layout of everything the app persists.
#[derive(Debug, Clone)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$VIBESYNC_DATA_DIR`, else the platform data directory, else `./vibesync-data`.
    pub fn resolve() -> Self {
        let root = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join("vibesync")))
            .unwrap_or_else(|| PathBuf::from("vibesync-data"));
        Self::new(root)
    }

    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(self.snapshots_dir()).with_context(|| {
            format!("failed to create data directory {}", self.root.display())
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn user_quotes(&self) -> PathBuf {
        self.root.join("quotes.json")
    }

    /// Default still frame location when `capture_frame_path` is unset.
    pub fn camera_frame(&self) -> PathBuf {
        self.root.join("camera.jpg")
    }

    pub fn analyzer_work_dir(&self) -> PathBuf {
        self.data_dir().join("analyzer")
    }

    pub fn event_log(&self) -> PathBuf {
        self.data_dir().join("log.json")
    }

    pub fn last_quote(&self) -> PathBuf {
        self.data_dir().join("last_quote.json")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir().join("snapshots")
    }

    fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }
}
