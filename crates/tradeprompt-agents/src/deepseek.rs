use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use tradeprompt_models::CompletionConfig;

use crate::completion::CompletionClient;
use crate::error::CompletionError;
use crate::prompts::default_system_prompt;
use crate::retry::RetryPolicy;

/// Longest slice of an error body carried into logs and error messages.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completion request body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// DeepSeek chat-completion client.
///
/// Holds only configuration and a pooled `reqwest::Client`, so one instance is
/// shared across all requests.
pub struct DeepSeekClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    system_prompt: String,
    retry: RetryPolicy,
}

impl DeepSeekClient {
    /// Build a client. A missing `api_key` is not an error here; it is
    /// reported by every call to [`CompletionClient::ask`] instead.
    pub fn new(config: &CompletionConfig, api_key: Option<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .build()
            .map_err(|e| CompletionError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(default_system_prompt),
            retry: RetryPolicy::from_config(config),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
        }
    }
}

/// Connection-level failures worth another attempt.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Pull `choices[0].message.content` out of a successful response body.
fn extract_content(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::Parse(format!("response is not valid JSON: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| CompletionError::Parse("missing choices[0].message.content".to_string()))
}

#[async_trait]
impl CompletionClient for DeepSeekClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn ask(&self, prompt: &str) -> Result<String, CompletionError> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("DEEPSEEK_API_KEY environment variable missing");
            return Err(CompletionError::Config(
                "API key not configured".to_string(),
            ));
        };

        let request = self.build_request(prompt);
        let max_attempts = self.retry.max_attempts();
        let start = Instant::now();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry.backoff(attempt - 1)).await;
            }

            debug!(model = %self.model, attempt, "Requesting completion");

            let response = match self
                .client
                .post(&self.api_url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) if is_transient(&e) => {
                    warn!(attempt, max_attempts, error = %e, "Completion request failed");
                    continue;
                }
                Err(e) => {
                    error!(attempt, error = %e, "Completion request failed");
                    return Err(CompletionError::Network(e.to_string()));
                }
            };

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                error!(attempt, error = %e, "Failed to read completion response body");
                CompletionError::Network(e.to_string())
            })?;

            if status.is_success() {
                let content = extract_content(&body).inspect_err(|e| {
                    error!(error = %e, "Completion response parsing failed");
                })?;
                info!(
                    model = %self.model,
                    attempt,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Completion received"
                );
                return Ok(content);
            }

            if self.retry.retries_status(status.as_u16()) && attempt < max_attempts {
                warn!(attempt, max_attempts, status = status.as_u16(), "Completion service error, retrying");
                continue;
            }

            error!(attempt, status = status.as_u16(), body = %truncate(&body), "Completion service error");
            return Err(CompletionError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(&body)
            )));
        }

        error!(
            attempts = max_attempts,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion service unreachable"
        );
        Err(CompletionError::MaxRetries {
            attempts: max_attempts,
        })
    }
}
