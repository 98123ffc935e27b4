//! Summarization via the OpenAI chat completions API.
//!
//! The pipeline depends on the [`Summarizer`] trait; [`OpenAiSummarizer`] is the hosted
//! implementation. Input text is truncated to a fixed character budget before it is sent,
//! with a visible notice appended, so requests stay within the model's context window
//! without attempting any semantic compression.

use crate::config::get_config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::borrow::Cow;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Character budget for document text handed to the model.
pub const MAX_INPUT_CHARS: usize = 12_000;

/// Fixed notice appended when a document is truncated.
pub const TRUNCATION_NOTICE: &str = "\n\n[Note: Document was truncated due to length.]";

const SYSTEM_PROMPT: &str = "You are a professional document summarizer. \
Your task is to read documents and produce clear, concise, and accurate summaries \
in 5 to 10 sentences. Focus on the main topics, key points, and conclusions.";

/// Errors surfaced while requesting a summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The API rejected the configured key.
    #[error("invalid OpenAI API key; check OPENAI_API_KEY")]
    InvalidApiKey,
    /// The API throttled the request.
    #[error("OpenAI rate limit exceeded; wait and try again")]
    RateLimited,
    /// The API could not be reached.
    #[error("could not connect to the OpenAI API: {0}")]
    Connection(String),
    /// The API returned an unexpected error response.
    #[error("OpenAI API returned {status}: {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Response body captured for diagnostics.
        message: String,
    },
    /// The API response could not be decoded.
    #[error("malformed OpenAI response: {0}")]
    InvalidResponse(String),
}

/// Capability consumed by the pipeline: summarize extracted document text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a natural-language summary of `text`, using `file_name` as context.
    async fn summarize(&self, text: &str, file_name: &str) -> Result<String, SummarizeError>;
}

/// Enforce the character budget, appending the truncation notice when text is cut.
///
/// Deterministic: the same input always truncates identically, to exactly the first
/// [`MAX_INPUT_CHARS`] characters plus [`TRUNCATION_NOTICE`].
pub fn truncate_for_model(text: &str) -> Cow<'_, str> {
    let total_chars = text.chars().count();
    if total_chars <= MAX_INPUT_CHARS {
        return Cow::Borrowed(text);
    }

    let mut truncated: String = text.chars().take(MAX_INPUT_CHARS).collect();
    truncated.push_str(TRUNCATION_NOTICE);
    tracing::warn!(
        original_chars = total_chars,
        budget = MAX_INPUT_CHARS,
        "Truncated document text before summarization"
    );
    Cow::Owned(truncated)
}

fn build_prompt(text: &str, file_name: &str) -> String {
    format!(
        "Please summarize the following document titled '{file_name}'.\n\
         Provide a clear and concise summary in 5 to 10 sentences, \
         covering the main topics, key points, and conclusions.\n\n\
         Document Content:\n{text}"
    )
}

/// Chat-completions client for summarization.
pub struct OpenAiSummarizer {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiSummarizer {
    /// Build a summarizer from the loaded configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self::with_base_url(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_max_tokens,
            config.openai_temperature,
            DEFAULT_BASE_URL.to_string(),
        )
    }

    /// Build a summarizer against an explicit base URL (used by tests).
    pub fn with_base_url(
        api_key: String,
        model: String,
        max_tokens: u32,
        temperature: f32,
        base_url: String,
    ) -> Self {
        let http = Client::builder()
            .user_agent("docsum/summarizer")
            .build()
            .expect("Failed to construct reqwest::Client for summarization");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            max_tokens,
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str, file_name: &str) -> Result<String, SummarizeError> {
        let prepared = truncate_for_model(text);
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_prompt(&prepared, file_name)},
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        tracing::info!(file = file_name, model = %self.model, "Requesting summary");
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| SummarizeError::Connection(error.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(SummarizeError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(SummarizeError::RateLimited),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                return Err(SummarizeError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        let body: ChatResponse = response.json().await.map_err(|error| {
            SummarizeError::InvalidResponse(format!("failed to decode response: {error}"))
        })?;

        let summary = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                SummarizeError::InvalidResponse("response carried no message content".to_string())
            })?;

        tracing::info!(file = file_name, "Summary received");
        Ok(summary.trim().to_string())
    }
}
