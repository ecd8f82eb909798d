pub mod api;
pub mod binance;
pub mod error;
pub mod gateway;
pub mod throttle;

pub mod test_support;

pub use api::{ExchangeApi, OrderAck, OrderRequest};
pub use binance::{BinanceClient, BinanceCredentials};
pub use error::ExchangeError;
pub use gateway::OrderGateway;
