use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

pub const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const API_KEY_ENV: &str = "GROQ_API_KEY";
const TEMPERATURE: f32 = 0.9;

/// Prompt in, completion out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat completion client pointed at Groq.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GroqClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            endpoint: GROQ_URL.to_string(),
        })
    }

    /// Reads the key from `GROQ_API_KEY`; a missing key is reported on each request.
    pub fn from_env(model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::new(std::env::var(API_KEY_ENV).ok(), model, timeout)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("missing {API_KEY_ENV}"))?;

        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": TEMPERATURE,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .context("Groq request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Groq API error {status}: {error_text}");
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .context("Groq response was not JSON")?;
        parse_completion(payload)
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Extracts the trimmed first choice; an empty completion is an error.
pub fn parse_completion(payload: serde_json::Value) -> Result<String> {
    let completion: ChatCompletion =
        serde_json::from_value(payload).context("invalid chat completion format")?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| anyhow!("chat completion had no choices"))?;

    if content.is_empty() {
        bail!("chat completion was empty");
    }
    Ok(content)
}
