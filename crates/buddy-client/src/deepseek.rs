use buddy_config::DeepSeekSettings;
use buddy_core::{BuddyError, CompletionClient, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const HTTP_TIMEOUT_SECS: u64 = 60;

/// Chat-completions client for the DeepSeek API (OpenAI-compatible wire format).
pub struct DeepSeekClient {
    http: reqwest::Client,
    settings: DeepSeekSettings,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl DeepSeekClient {
    pub fn new(settings: DeepSeekSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| BuddyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    fn extract_content(response: ChatCompletionResponse) -> Result<String> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| failed("Invalid response from DeepSeek API: No choices returned"))?;

        choice
            .message
            .and_then(|m| m.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| failed("Invalid response from DeepSeek API: No content in response"))
    }
}

fn failed(reason: impl std::fmt::Display) -> BuddyError {
    BuddyError::CompletionError(format!("Failed to generate message: {}", reason))
}

#[async_trait::async_trait]
impl CompletionClient for DeepSeekClient {
    #[instrument(skip_all, fields(model = %self.settings.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.settings.api_key.is_empty() {
            return Err(BuddyError::ConfigError("DeepSeek API key is not configured".to_string()));
        }

        let response = self
            .http
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("DeepSeek API returned {}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(failed)?;
        let content = Self::extract_content(parsed)?;

        debug!("Received completion of {} chars", content.chars().count());
        Ok(content)
    }
}
