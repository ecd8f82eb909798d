use thiserror::Error;

/// Every way a completion can fail. Callers branch on the variant, never on
/// the shape of the returned text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Completion client misconfigured: {0}")]
    Config(String),

    #[error("Completion service unavailable: {0}")]
    Network(String),

    #[error("No response from completion service after {attempts} attempts")]
    MaxRetries { attempts: u32 },

    #[error("Invalid completion response format: {0}")]
    Parse(String),
}

impl CompletionError {
    /// Stable machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Config(_) => "CONFIG_ERROR",
            CompletionError::Network(_) => "NETWORK_ERROR",
            CompletionError::MaxRetries { .. } => "MAX_RETRIES",
            CompletionError::Parse(_) => "PARSE_ERROR",
        }
    }

    /// HTTP status this failure maps to at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            CompletionError::Config(_) => 500,
            CompletionError::Network(_) => 503,
            CompletionError::MaxRetries { .. } => 504,
            CompletionError::Parse(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_codes() {
        let cases = [
            (CompletionError::Config("no key".into()), "CONFIG_ERROR", 500),
            (CompletionError::Network("refused".into()), "NETWORK_ERROR", 503),
            (CompletionError::MaxRetries { attempts: 4 }, "MAX_RETRIES", 504),
            (CompletionError::Parse("no choices".into()), "PARSE_ERROR", 502),
        ];
        for (err, kind, code) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.status_code(), code);
        }
    }
}
