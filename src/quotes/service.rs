use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use log::{info, warn};

use super::{FallbackQuotes, TextGenerator};
use crate::{
    models::{ActivitySnapshot, Emotion, QuoteRecord, UserStateSnapshot},
    store::{read_json, write_json_pretty},
};

pub const DEDUP_WINDOW_HOURS: i64 = 24;
/// Window title placed in the reduced context used for the second attempt.
pub const DEGRADED_WINDOW: &str = "VibeSync";

const SYSTEM_PROMPT: &str = "You write short, uplifting messages for someone working at a computer. \
Reply with one or two sentences only. No preface, no quotation marks, no formatting.";

/// Turns a user state into a motivational line, never returning nothing.
pub struct QuoteService {
    generator: Arc<dyn TextGenerator>,
    record_path: PathBuf,
    fallback: FallbackQuotes,
    timeout: Duration,
    record_lock: Mutex<()>,
}

impl QuoteService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        record_path: impl Into<PathBuf>,
        fallback: FallbackQuotes,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            record_path: record_path.into(),
            fallback,
            timeout,
            record_lock: Mutex::new(()),
        }
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Asks the generator for a quote; `None` on failure, timeout or a repeat within 24h.
    pub async fn request(&self, state: &UserStateSnapshot) -> Option<String> {
        let prompt = build_prompt(state);
        let completion =
            tokio::time::timeout(self.timeout, self.generator.complete(SYSTEM_PROMPT, &prompt))
                .await;

        let text = match completion {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(err)) => {
                warn!("[Quotes] Generator failed: {err:#}");
                return None;
            }
            Err(_) => {
                warn!("[Quotes] Generator timed out after {:?}", self.timeout);
                return None;
            }
        };

        if text.is_empty() {
            warn!("[Quotes] Generator returned an empty quote");
            return None;
        }

        self.accept(text)
    }

    fn accept(&self, text: String) -> Option<String> {
        let _guard = self
            .record_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Utc::now();

        if let Some(previous) = read_json::<QuoteRecord>(&self.record_path) {
            if previous.suppresses(&text, now, chrono::Duration::hours(DEDUP_WINDOW_HOURS)) {
                info!("[Quotes] Suppressed repeat of a recent quote");
                return None;
            }
        }

        if let Err(err) = write_json_pretty(&self.record_path, &QuoteRecord::new(text.clone(), now)) {
            warn!("[Quotes] Failed to persist last quote: {err:#}");
        }
        info!("[Quotes] Quote: {text}");
        Some(text)
    }

    /// Second attempt with a reduced context, then the static table.
    pub async fn fallback(&self, emotion: Emotion) -> String {
        let degraded = UserStateSnapshot::new(emotion, ActivitySnapshot::idle(DEGRADED_WINDOW));
        if let Some(quote) = self.request(&degraded).await {
            return quote;
        }

        let quote = self.fallback.pick(emotion, &mut rand::thread_rng());
        info!("[Quotes] Using fallback quote for {emotion}");
        quote
    }

    pub async fn quote_for(&self, state: &UserStateSnapshot) -> String {
        match self.request(state).await {
            Some(quote) => quote,
            None => self.fallback(state.emotion).await,
        }
    }

    pub fn last_quote(&self) -> Option<QuoteRecord> {
        read_json(&self.record_path)
    }
}

pub fn build_prompt(state: &UserStateSnapshot) -> String {
    let activity = &state.activity;
    format!(
        "The user currently looks {emotion}. They are working in \"{window}\", \
typing at {typing:.2} keys/sec and moving the mouse at {mouse:.2} px/sec. \
Write a motivational message that fits this moment.",
        emotion = state.emotion,
        window = activity.active_window,
        typing = activity.typing_speed,
        mouse = activity.mouse_speed,
    )
}
