use std::path::Path;

use anyhow::{Context, Result};
use tradeprompt_exchange::BinanceCredentials;
use tradeprompt_models::AppConfig;

/// API secrets. Read from the environment only, never from config files.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub deepseek_api_key: Option<String>,
    pub binance: Option<BinanceCredentials>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let binance = match (lookup("BINANCE_API_KEY"), lookup("BINANCE_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => Some(BinanceCredentials {
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Self {
            deepseek_api_key: lookup("DEEPSEEK_API_KEY"),
            binance,
        }
    }

    /// Exchange credentials are needed before the first order can be placed,
    /// so their absence stops startup.
    pub fn require_binance(&self) -> Result<BinanceCredentials> {
        self.binance
            .clone()
            .context("BINANCE_API_KEY and BINANCE_API_SECRET must both be set")
    }
}

/// Load configuration from an optional TOML file, then apply environment
/// overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        }
        None => AppConfig::default(),
    };
    apply_env(&mut config, env_var);
    Ok(config)
}

pub fn apply_env(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("DEEPSEEK_API_URL") {
        config.completion.api_url = url;
    }
    if let Some(prompt) = lookup("SYSTEM_PROMPT") {
        config.completion.system_prompt = Some(prompt);
    }
    if let Some(debug) = lookup("CCXT_DEBUG") {
        config.exchange.verbose = debug.eq_ignore_ascii_case("true");
    }
    if let Some(url) = lookup("BINANCE_API_URL") {
        config.exchange.base_url = url;
    }
    if let Some(bind) = lookup("TRADEPROMPT_BIND") {
        config.server.bind = bind;
    }
}

/// Blank variables count as unset.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        apply_env(
            &mut config,
            lookup(&[
                ("DEEPSEEK_API_URL", "http://localhost:9000/v1/chat/completions"),
                ("SYSTEM_PROMPT", "Answer with JSON only."),
                ("CCXT_DEBUG", "TRUE"),
                ("BINANCE_API_URL", "https://testnet.binance.vision"),
                ("TRADEPROMPT_BIND", "127.0.0.1:9999"),
            ]),
        );

        assert_eq!(config.completion.api_url, "http://localhost:9000/v1/chat/completions");
        assert_eq!(config.completion.system_prompt.as_deref(), Some("Answer with JSON only."));
        assert!(config.exchange.verbose);
        assert_eq!(config.exchange.base_url, "https://testnet.binance.vision");
        assert_eq!(config.server.bind, "127.0.0.1:9999");
    }

    #[test]
    fn debug_flag_only_accepts_true() {
        let mut config = AppConfig::default();
        apply_env(&mut config, lookup(&[("CCXT_DEBUG", "1")]));
        assert!(!config.exchange.verbose);
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let mut config = AppConfig::default();
        apply_env(&mut config, lookup(&[]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn binance_credentials_need_both_halves() {
        let creds = Credentials::from_lookup(lookup(&[("BINANCE_API_KEY", "k")]));
        assert!(creds.binance.is_none());
        assert!(creds.require_binance().is_err());

        let creds = Credentials::from_lookup(lookup(&[
            ("BINANCE_API_KEY", "k"),
            ("BINANCE_API_SECRET", "s"),
            ("DEEPSEEK_API_KEY", "d"),
        ]));
        assert_eq!(creds.require_binance().unwrap().api_key, "k");
        assert_eq!(creds.deepseek_api_key.as_deref(), Some("d"));
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[exchange]\nmax_attempts = 5\n\n[completion]\nmax_retries = 1"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.exchange.max_attempts, 5);
        assert_eq!(config.completion.max_retries, 1);
        assert_eq!(config.completion.model, "deepseek-chat");
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config: AppConfig =
            toml::from_str(include_str!("../../../config/tradeprompt.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
