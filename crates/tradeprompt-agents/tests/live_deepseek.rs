//! Integration tests that call the real DeepSeek API.
//!
//! These tests are `#[ignore]` by default. They require `DEEPSEEK_API_KEY`
//! in the environment and spend a small amount of API credit.
//!
//! Run explicitly with:
//! ```bash
//! cargo test -p tradeprompt-agents --test live_deepseek -- --ignored
//! ```

use tradeprompt_agents::{parse_order_intent, CompletionClient, DeepSeekClient};
use tradeprompt_models::{CompletionConfig, OrderSide};

/// The default persona should make the model answer with a parseable intent.
///
/// This catches drift in the model's output format that would otherwise only
/// surface as 422s in production.
#[tokio::test]
#[ignore]
async fn default_persona_yields_order_intent() {
    let Ok(api_key) = std::env::var("DEEPSEEK_API_KEY") else {
        eprintln!("Skipping: DEEPSEEK_API_KEY not set");
        return;
    };

    let client = DeepSeekClient::new(&CompletionConfig::default(), Some(api_key)).unwrap();
    let raw = client
        .ask("Buy 0.001 BTC against USDT at market price.")
        .await
        .expect("DeepSeek request failed");

    let intent = parse_order_intent(&raw).unwrap_or_else(|e| {
        panic!("Model reply is not an order intent ({e}).\nRaw output:\n---\n{raw}\n---")
    });

    assert_eq!(intent.side, OrderSide::Buy);
    assert!(intent.symbol.starts_with("BTC"), "unexpected symbol {}", intent.symbol);
}
