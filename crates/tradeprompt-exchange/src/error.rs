use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Exchange network error: {0}")]
    Network(String),

    #[error("Exchange rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Unexpected exchange response: {0}")]
    Decode(String),

    #[error("Exchange client misconfigured: {0}")]
    Config(String),
}

impl ExchangeError {
    /// Only connectivity failures are worth retrying; rejections are final.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExchangeError::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_transient() {
        assert!(ExchangeError::Network("reset".into()).is_transient());
        assert!(!ExchangeError::Rejected {
            code: -2010,
            message: "Account has insufficient balance".into()
        }
        .is_transient());
        assert!(!ExchangeError::Decode("bad json".into()).is_transient());
        assert!(!ExchangeError::Config("no key".into()).is_transient());
    }
}
