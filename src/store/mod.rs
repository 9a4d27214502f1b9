mod event_log;

pub use event_log::EventLog;

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::warn;
use serde::{de::DeserializeOwned, Serialize};

/// Reads a JSON document, returning `None` when the file is missing or unparsable.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!("Failed to read {}: {err}", path.display());
            return None;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Ignoring unparsable {}: {err}", path.display());
            None
        }
    }
}

pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    read_json(path).unwrap_or_default()
}

/// Replaces `path` via a sibling temp file, so a failed write leaves the old contents.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let serialized = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;

    let temp_path = temp_sibling(path);
    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(serialized.as_bytes())?;
        file.sync_all()
    });
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err).with_context(|| format!("failed to write {}", temp_path.display()));
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err).with_context(|| format!("failed to replace {}", path.display()));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_corrupt_files_read_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();

        let from_missing: Vec<String> = read_json_or_default(&missing);
        let from_corrupt: Vec<String> = read_json_or_default(&corrupt);

        assert!(from_missing.is_empty());
        assert!(from_corrupt.is_empty());
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        write_json_pretty(&path, &vec!["a", "b"]).unwrap();

        let back: Vec<String> = read_json_or_default(&path);
        assert_eq!(back, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn failed_write_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        write_json_pretty(&path, &vec!["first", "second"]).unwrap();

        // A directory squatting on the temp name makes the write fail.
        fs::create_dir(dir.path().join("log.json.tmp")).unwrap();
        assert!(write_json_pretty(&path, &vec!["replacement"]).is_err());

        let kept: Vec<String> = read_json_or_default(&path);
        assert_eq!(kept, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn successful_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        write_json_pretty(&path, &1).unwrap();
        write_json_pretty(&path, &2).unwrap();

        assert_eq!(read_json::<u32>(&path), Some(2));
        assert!(!dir.path().join("doc.json.tmp").exists());
    }
}
