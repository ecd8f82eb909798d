use std::time::Duration;

use tradeprompt_models::CompletionConfig;

/// Bounded retry with exponential backoff for completion requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CompletionConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_factor: config.backoff_factor,
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_factor: 0.0,
            retry_statuses: Vec::new(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Delay before the `retry`-th retry (1-based): `factor * 2^(retry-1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let secs = self.backoff_factor * 2f64.powi(retry as i32 - 1);
        Duration::from_secs_f64(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.backoff(1), Duration::from_secs_f64(0.3));
        assert_eq!(policy.backoff(2), Duration::from_secs_f64(0.6));
        assert_eq!(policy.backoff(3), Duration::from_secs_f64(1.2));
    }

    #[test]
    fn retries_only_listed_statuses() {
        let policy = RetryPolicy::default();
        assert!(policy.retries_status(500));
        assert!(policy.retries_status(502));
        assert!(policy.retries_status(504));
        assert!(!policy.retries_status(503));
        assert!(!policy.retries_status(429));
    }

    #[test]
    fn none_policy() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.backoff(1), Duration::ZERO);
    }
}
