//! tradeprompt - natural-language order relay
//!
//! Accepts a trading prompt over HTTP, asks a chat-completion model for a
//! structured order intent, validates it, and places it on the exchange.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use tradeprompt::{build_handler, config::Credentials, models::AppConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let handler = build_handler(&AppConfig::default(), &Credentials::from_env())?;
//! let response = handler.handle(br#"{"prompt": "buy 0.01 BTC"}"#).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use tradeprompt_agents as agents;
pub use tradeprompt_exchange as exchange;
pub use tradeprompt_models as models;

pub use error::ApiError;
pub use handler::{StrategyHandler, StrategyResponse};

use std::sync::Arc;

use tracing::warn;
use tradeprompt_agents::{CompletionClient, DeepSeekClient};
use tradeprompt_exchange::{BinanceClient, ExchangeApi, OrderGateway};
use tradeprompt_models::AppConfig;

use crate::config::Credentials;

/// Build the request handler from configuration.
///
/// Clients are constructed once here and shared by every request.
pub fn build_handler(
    config: &AppConfig,
    credentials: &Credentials,
) -> Result<StrategyHandler, anyhow::Error> {
    if credentials.deepseek_api_key.is_none() {
        warn!("DEEPSEEK_API_KEY not set; every completion will fail");
    }
    let completion: Arc<dyn CompletionClient> = Arc::new(DeepSeekClient::new(
        &config.completion,
        credentials.deepseek_api_key.clone(),
    )?);

    let exchange: Arc<dyn ExchangeApi> = Arc::new(BinanceClient::new(
        &config.exchange,
        Some(credentials.require_binance()?),
    )?);
    let gateway = Arc::new(OrderGateway::new(exchange, config.exchange.max_attempts));

    Ok(StrategyHandler::new(completion, gateway))
}
