use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Names of the processes currently running on this machine.
pub trait ProcessSource: Send + Sync {
    fn process_names(&self) -> Result<Vec<String>>;
}

/// Process enumeration through `sysinfo`.
pub struct SysinfoProcesses {
    system: Mutex<System>,
    own_pid: u32,
}

impl SysinfoProcesses {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            own_pid: std::process::id(),
        }
    }
}

impl Default for SysinfoProcesses {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSource for SysinfoProcesses {
    fn process_names(&self) -> Result<Vec<String>> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::new());

        let names = system
            .processes()
            .iter()
            .filter(|(pid, _)| pid.as_u32() != self.own_pid)
            .map(|(_, process)| process.name().to_string_lossy().into_owned())
            .collect();
        Ok(names)
    }
}

/// First running process whose lowercase name contains one of `needles`.
pub fn find_matching_process<'a>(names: &'a [String], needles: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find(|name| {
            let lowered = name.to_lowercase();
            needles.iter().any(|needle| lowered.contains(needle))
        })
        .map(String::as_str)
}
