use anyhow::Result;
use log::info;

pub const NOTIFICATION_TITLE: &str = "VibeSync Motivation";
const WRAP_WIDTH: usize = 50;

/// Toast/desktop notification sink. Fire-and-forget from the caller's side.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Writes notifications to the log; used when no desktop notifier is wired in.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<()> {
        info!("[Notification] {title}:\n{}", wrap_text(message, WRAP_WIDTH));
        Ok(())
    }
}

/// Greedy word wrap. Words longer than `width` are kept whole on their own line.
pub fn wrap_text(message: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in message.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}
