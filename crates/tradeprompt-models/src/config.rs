use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration. Secrets are not part of it; they come from the
/// environment only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Configuration for the chat-completion client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// System instruction sent ahead of every prompt. Falls back to the
    /// built-in trading persona when unset.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_seconds")]
    pub read_timeout_seconds: u64,
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff_factor * 2^(n-1)` seconds.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Response statuses that trigger a retry.
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

impl CompletionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            system_prompt: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_seconds: default_read_timeout_seconds(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            retry_statuses: default_retry_statuses(),
        }
    }
}

/// Configuration for the exchange client and order gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeConfig {
    #[serde(default = "default_exchange_url")]
    pub base_url: String,
    #[serde(default = "default_exchange_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Submission attempts per order, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    /// Minimum spacing between consecutive exchange requests.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Log every exchange request and response body.
    #[serde(default)]
    pub verbose: bool,
}

impl ExchangeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_url(),
            timeout_seconds: default_exchange_timeout_seconds(),
            max_attempts: default_max_attempts(),
            recv_window_ms: default_recv_window_ms(),
            rate_limit_ms: default_rate_limit_ms(),
            verbose: false,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_api_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}
fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_connect_timeout_ms() -> u64 {
    3050
}
fn default_read_timeout_seconds() -> u64 {
    27
}
fn default_max_retries() -> u32 {
    3
}
fn default_backoff_factor() -> f64 {
    0.3
}
fn default_retry_statuses() -> Vec<u16> {
    vec![500, 502, 504]
}
fn default_exchange_url() -> String {
    "https://api.binance.com".to_string()
}
fn default_exchange_timeout_seconds() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_recv_window_ms() -> u64 {
    5000
}
fn default_rate_limit_ms() -> u64 {
    50
}
