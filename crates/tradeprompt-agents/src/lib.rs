pub mod completion;
pub mod deepseek;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod retry;

pub mod test_support;

pub use completion::CompletionClient;
pub use deepseek::DeepSeekClient;
pub use error::CompletionError;
pub use parser::parse_order_intent;
pub use retry::RetryPolicy;
