use std::{
    path::PathBuf,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Context, Result};
use image::ImageFormat;

use super::{EmotionClassifier, FaceDetector, Frame};
use crate::models::Emotion;

/// Face detection and emotion classification delegated to an external program.
///
/// The program is invoked as `<command...> faces <frame.png>` (prints a face count)
/// or `<command...> emotion <frame.png>` (prints the dominant emotion label).
/// A run that outlives `timeout` is killed and counts as a failure.
pub struct CommandAnalyzer {
    command: Vec<String>,
    work_dir: PathBuf,
    timeout: Duration,
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl CommandAnalyzer {
    pub fn new(command: Vec<String>, work_dir: PathBuf, timeout: Duration) -> Result<Self> {
        if command.first().map_or(true, |program| program.trim().is_empty()) {
            bail!("analyzer command is empty");
        }
        Ok(Self {
            command,
            work_dir,
            timeout,
        })
    }

    fn run(&self, mode: &str, frame: &Frame) -> Result<String> {
        std::fs::create_dir_all(&self.work_dir)
            .with_context(|| format!("failed to create {}", self.work_dir.display()))?;
        let frame_path = self.work_dir.join(format!("{mode}-frame.png"));
        frame
            .save_with_format(&frame_path, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", frame_path.display()))?;

        let mut child = Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(mode)
            .arg(&frame_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run analyzer {}", self.command[0]))?;

        let deadline = Instant::now() + self.timeout;
        while child.try_wait()?.is_none() {
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                bail!("analyzer timed out after {:?} for {mode}", self.timeout);
            }
            thread::sleep(POLL_INTERVAL);
        }
        let output = child
            .wait_with_output()
            .context("failed to collect analyzer output")?;

        if !output.status.success() {
            bail!(
                "analyzer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let answer = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_owned);
        answer.ok_or_else(|| anyhow!("analyzer printed nothing for {mode}"))
    }
}

impl FaceDetector for CommandAnalyzer {
    fn count_faces(&self, frame: &Frame) -> Result<usize> {
        let answer = self.run("faces", frame)?;
        answer
            .parse()
            .with_context(|| format!("analyzer returned a non-numeric face count '{answer}'"))
    }
}

impl EmotionClassifier for CommandAnalyzer {
    fn classify(&self, frame: &Frame) -> Result<Emotion> {
        self.run("emotion", frame)?.parse()
    }
}

/// Stand-in when no analyzer is configured: every face check and classification fails.
#[derive(Debug, Default)]
pub struct UnconfiguredAnalyzer;

impl FaceDetector for UnconfiguredAnalyzer {
    fn count_faces(&self, _frame: &Frame) -> Result<usize> {
        bail!("no analyzer_command configured")
    }
}

impl EmotionClassifier for UnconfiguredAnalyzer {
    fn classify(&self, _frame: &Frame) -> Result<Emotion> {
        bail!("no analyzer_command configured")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str, dir: &tempfile::TempDir) -> CommandAnalyzer {
        CommandAnalyzer::new(
            vec!["sh".into(), "-c".into(), script.into(), "analyzer".into()],
            dir.path().to_path_buf(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn reads_face_count_and_label_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new_rgb8(2, 2);

        let faces = shell("echo 2", &dir);
        assert_eq!(faces.count_faces(&frame).unwrap(), 2);

        let mood = shell("printf '\\nSurprise\\n'", &dir);
        assert_eq!(mood.classify(&frame).unwrap(), Emotion::Surprise);
    }

    #[test]
    fn passes_mode_and_frame_path() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = shell("test \"$1\" = emotion && test -f \"$2\" && echo fear", &dir);

        assert_eq!(analyzer.classify(&Frame::new_rgb8(2, 2)).unwrap(), Emotion::Fear);
    }

    #[test]
    fn failures_and_unknown_labels_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new_rgb8(2, 2);

        assert!(shell("exit 3", &dir).classify(&frame).is_err());
        assert!(shell("echo bored", &dir).classify(&frame).is_err());
        assert!(shell("echo many", &dir).count_faces(&frame).is_err());
        let empty = CommandAnalyzer::new(Vec::new(), dir.path().to_path_buf(), Duration::from_secs(1));
        assert!(empty.is_err());
    }

    #[test]
    fn hung_analyzer_is_killed_at_the_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = CommandAnalyzer::new(
            vec!["sh".into(), "-c".into(), "sleep 30".into(), "analyzer".into()],
            dir.path().to_path_buf(),
            Duration::from_millis(300),
        )
        .unwrap();

        let started = Instant::now();
        let err = analyzer.count_faces(&Frame::new_rgb8(2, 2)).unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
