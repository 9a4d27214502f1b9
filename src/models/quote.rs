use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The most recently accepted generated quote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteRecord {
    pub quote: String,
    pub timestamp: DateTime<Utc>,
}

impl QuoteRecord {
    pub fn new(quote: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            quote: quote.into(),
            timestamp,
        }
    }

    /// True when `text` is this quote and it was accepted less than `window` before `now`.
    pub fn suppresses(&self, text: &str, now: DateTime<Utc>, window: Duration) -> bool {
        self.quote == text && now.signed_duration_since(self.timestamp) < window
    }
}

/// A quote authored by the user and merged into the fallback table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserQuote {
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub author: Option<String>,
}

fn default_category() -> String {
    "neutral".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppression_expires_after_window() {
        let accepted = Utc::now();
        let record = QuoteRecord::new("Keep going.", accepted);
        let window = Duration::hours(24);

        assert!(record.suppresses("Keep going.", accepted + Duration::hours(23), window));
        assert!(!record.suppresses("Keep going.", accepted + Duration::hours(24), window));
        assert!(!record.suppresses("Something else.", accepted, window));
    }

    #[test]
    fn user_quote_defaults_category() {
        let quote: UserQuote = serde_json::from_str(r#"{"quote": "Breathe."}"#).unwrap();
        assert_eq!(quote.category, "neutral");
        assert_eq!(quote.author, None);
    }
}
