pub mod config;
pub mod market;
pub mod order_intent;
pub mod order_result;
pub mod prompt;

pub use config::{AppConfig, CompletionConfig, ExchangeConfig, ServerConfig};
pub use market::MarketInfo;
pub use order_intent::{IntentError, OrderIntent, OrderSide, OrderType};
pub use order_result::{FailureKind, Fill, FillStatus, OrderFailure, OrderResult};
pub use prompt::{PromptRequest, MAX_BODY_BYTES, MAX_PROMPT_CHARS};
