use serde::{Deserialize, Serialize};

/// Largest accepted `/strategy/ask` body, in bytes.
pub const MAX_BODY_BYTES: usize = 10_240;

/// Prompts are cut to this many characters after trimming.
pub const MAX_PROMPT_CHARS: usize = 500;

/// Inbound payload of `/strategy/ask`.
///
/// `prompt` is kept as a raw JSON value so that non-string prompts can be
/// coerced instead of rejected at deserialization time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: serde_json::Value,
}

impl PromptRequest {
    /// The prompt coerced to text, trimmed, and cut to [`MAX_PROMPT_CHARS`].
    ///
    /// Strings are taken as-is, `null` becomes empty, and any other JSON value
    /// is rendered as its compact JSON text.
    pub fn sanitized_prompt(&self) -> String {
        let raw = match &self.prompt {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        raw.trim().chars().take(MAX_PROMPT_CHARS).collect()
    }
}
