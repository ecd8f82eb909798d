use async_trait::async_trait;

use crate::error::CompletionError;

/// A chat-completion backend. Mockable for testing.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send one prompt and return the model's raw reply text.
    async fn ask(&self, prompt: &str) -> Result<String, CompletionError>;
}
