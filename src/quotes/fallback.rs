use std::{collections::HashMap, path::Path};

use anyhow::{bail, Result};
use log::info;
use rand::{seq::SliceRandom, Rng};

use crate::{
    models::{Emotion, UserQuote},
    store::{read_json_or_default, write_json_pretty},
};

const LAST_RESORT: &str = "One small step is still a step forward.";

const BUILTIN_QUOTES: [(Emotion, [&str; 3]); 7] = [
    (
        Emotion::Happy,
        [
            "That good mood looks great on you. Pass it along.",
            "Ride this wave and let it carry the rest of your day.",
            "Joy shared is joy doubled. Keep it going.",
        ],
    ),
    (
        Emotion::Sad,
        [
            "Heavy days end too. Be gentle with yourself today.",
            "You have come through hard days before, and you will again.",
            "It is fine to slow down. You are still moving.",
        ],
    ),
    (
        Emotion::Angry,
        [
            "Take one slow breath before the next move.",
            "Step back for a minute. The problem will still be solvable.",
            "Turn that heat into focus and aim it somewhere useful.",
        ],
    ),
    (
        Emotion::Surprise,
        [
            "Plot twists make the best stories. See where this one goes.",
            "Unexpected is not the same as bad. Stay curious.",
            "Let the surprise sharpen you, not shake you.",
        ],
    ),
    (
        Emotion::Fear,
        [
            "Brave just means doing it while your hands shake a little.",
            "Every challenge so far has ended with you still standing.",
            "Name the fear, then take the smallest next step anyway.",
        ],
    ),
    (
        Emotion::Disgust,
        [
            "Not everything deserves your attention. Let this one go.",
            "Clear the clutter and keep what actually matters.",
            "Some messes point straight at what needs fixing.",
        ],
    ),
    (
        Emotion::Neutral,
        [
            "Steady is underrated. Keep the rhythm.",
            "Quiet progress is still progress.",
            "Today is an open page. Write something small and good on it.",
        ],
    ),
];

/// Static per-emotion quotes, extended with the user's own entries.
#[derive(Debug, Clone)]
pub struct FallbackQuotes {
    buckets: HashMap<Emotion, Vec<String>>,
}

impl FallbackQuotes {
    pub fn builtin() -> Self {
        let buckets = BUILTIN_QUOTES
            .iter()
            .map(|(emotion, quotes)| (*emotion, quotes.iter().map(|q| q.to_string()).collect()))
            .collect();
        Self { buckets }
    }

    /// Built-in table plus whatever parses from the user's quotes file.
    pub fn load(user_quotes_path: &Path) -> Self {
        let mut quotes = Self::builtin();
        let user_quotes: Vec<UserQuote> = read_json_or_default(user_quotes_path);
        let merged = quotes.merge_user_quotes(user_quotes);
        if merged > 0 {
            info!("[Quotes] Merged {merged} custom quote(s)");
        }
        quotes
    }

    /// Entries without text are skipped; unknown categories land in `neutral`.
    pub fn merge_user_quotes(&mut self, user_quotes: impl IntoIterator<Item = UserQuote>) -> usize {
        let mut merged = 0;
        for entry in user_quotes {
            let Some(text) = entry.quote.filter(|text| !text.trim().is_empty()) else {
                continue;
            };
            let emotion = entry.category.parse().unwrap_or(Emotion::Neutral);
            self.buckets.entry(emotion).or_default().push(text);
            merged += 1;
        }
        merged
    }

    pub fn bucket(&self, emotion: Emotion) -> &[String] {
        self.buckets.get(&emotion).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pick<R: Rng + ?Sized>(&self, emotion: Emotion, rng: &mut R) -> String {
        self.bucket(emotion)
            .choose(rng)
            .or_else(|| self.bucket(Emotion::Neutral).choose(rng))
            .cloned()
            .unwrap_or_else(|| LAST_RESORT.to_string())
    }
}

/// Appends a user-authored quote to the quotes file.
pub fn append_user_quote(
    path: &Path,
    quote: &str,
    category: Option<&str>,
    author: Option<&str>,
) -> Result<UserQuote> {
    let quote = quote.trim();
    if quote.is_empty() {
        bail!("quote text is empty");
    }

    let category = category
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| Emotion::Neutral.as_str().to_string());

    let entry = UserQuote {
        quote: Some(quote.to_string()),
        category,
        author: Some(author.unwrap_or("Custom").to_string()),
    };

    let mut entries: Vec<UserQuote> = read_json_or_default(path);
    entries.push(entry.clone());
    write_json_pretty(path, &entries)?;
    Ok(entry)
}
