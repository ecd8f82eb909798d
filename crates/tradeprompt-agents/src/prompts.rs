/// Schema description appended to the default system prompt.
fn response_schema() -> String {
    let example = serde_json::json!({
        "symbol": "BTCUSDT",
        "side": "buy",
        "amount": 0.01,
        "type": "market",
        "price": null
    });
    serde_json::to_string_pretty(&example).unwrap_or_default()
}

/// The built-in persona used when no system prompt is configured.
pub fn default_system_prompt() -> String {
    format!(
        "You are a professional cryptocurrency trading strategy assistant. Turn the user's \
         request into exactly one spot order.\n\n\
         ## OUTPUT FORMAT\n\n\
         Respond with a single JSON object and nothing else:\n{}\n\n\
         ## RULES\n\n\
         - `symbol`: exchange symbol without separators (e.g. BTCUSDT, ETHUSDT)\n\
         - `side`: \"buy\" or \"sell\"\n\
         - `amount`: base-asset quantity as a number\n\
         - `type`: \"market\" or \"limit\"\n\
         - `price`: required for limit orders, null for market orders\n",
        response_schema()
    )
}
