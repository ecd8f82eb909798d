use async_trait::async_trait;
use tradeprompt_models::{MarketInfo, OrderSide};

use crate::error::ExchangeError;

/// Everything needed to submit one order except the order kind.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub amount: f64,
    /// Reused across retries of the same intent so the exchange can reject
    /// a duplicate instead of filling twice.
    pub client_order_id: String,
}

/// The exchange's acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub symbol: String,
    pub executed_qty: f64,
    /// Exchange-native order status, e.g. `FILLED` or `NEW`.
    pub status: String,
}

/// The exchange operations the order gateway relies on. Mockable for testing.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    fn name(&self) -> &str;

    async fn market(&self, symbol: &str) -> Result<MarketInfo, ExchangeError>;

    async fn create_market_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError>;

    async fn create_limit_order(
        &self,
        order: &OrderRequest,
        price: f64,
    ) -> Result<OrderAck, ExchangeError>;
}
