use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use crate::{scheduler::MonitoringSchedule, store::write_json_pretty};

const DEFAULT_QUOTE_TIMEOUT_SECS: u64 = 20;
const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 15;
const DEFAULT_QUOTE_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "default_schedule")]
    pub monitoring_schedule: String,
    #[serde(default)]
    pub capture_frame_path: Option<PathBuf>,
    #[serde(default)]
    pub analyzer_command: Option<Vec<String>>,
    #[serde(default = "default_analyzer_timeout")]
    pub analyzer_timeout_secs: u64,
    #[serde(default = "default_quote_timeout")]
    pub quote_timeout_secs: u64,
    #[serde(default = "default_quote_model")]
    pub quote_model: String,
    /// Keys owned by other tools (theme, popup size, ...), kept on rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_schedule() -> String {
    MonitoringSchedule::default().label().into()
}

fn default_analyzer_timeout() -> u64 {
    DEFAULT_ANALYZER_TIMEOUT_SECS
}

fn default_quote_timeout() -> u64 {
    DEFAULT_QUOTE_TIMEOUT_SECS
}

fn default_quote_model() -> String {
    DEFAULT_QUOTE_MODEL.into()
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            monitoring_schedule: default_schedule(),
            capture_frame_path: None,
            analyzer_command: None,
            analyzer_timeout_secs: DEFAULT_ANALYZER_TIMEOUT_SECS,
            quote_timeout_secs: DEFAULT_QUOTE_TIMEOUT_SECS,
            quote_model: default_quote_model(),
            extra: serde_json::Map::new(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Settings at {} are unparsable, using defaults: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> UserSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-reads the schedule from disk so edits apply to the next cycle.
    /// An unreadable document yields the default schedule label.
    pub fn monitoring_schedule(&self) -> String {
        if !self.path.exists() {
            return self.current().monitoring_schedule;
        }

        match self.reload() {
            Ok(()) => self.current().monitoring_schedule,
            Err(err) => {
                warn!("Falling back to default schedule: {err:#}");
                default_schedule()
            }
        }
    }

    pub fn update_schedule(&self, schedule: &str) -> Result<MonitoringSchedule> {
        let Some(parsed) = MonitoringSchedule::parse(schedule) else {
            let accepted: Vec<&str> = MonitoringSchedule::ALL.iter().map(|s| s.label()).collect();
            bail!(
                "unknown schedule '{schedule}'; expected one of: {}",
                accepted.join(", ")
            );
        };

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.monitoring_schedule = parsed.label().into();
        self.persist(&guard)?;
        Ok(parsed)
    }

    pub fn reset(&self) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = UserSettings::default();
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: UserSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings at {}", self.path.display()))?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        write_json_pretty(&self.path, data)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
