use std::sync::Arc;

use tracing::{info, warn};
use tradeprompt_models::{OrderIntent, OrderResult, OrderType};
use uuid::Uuid;

use crate::api::{ExchangeApi, OrderAck, OrderRequest};
use crate::error::ExchangeError;

/// Validates an [`OrderIntent`] against live market metadata and submits it.
///
/// Every exchange outcome is folded into an [`OrderResult`]. Only a
/// misconfigured client surfaces as `Err`.
pub struct OrderGateway {
    exchange: Arc<dyn ExchangeApi>,
    max_attempts: u32,
}

impl OrderGateway {
    pub fn new(exchange: Arc<dyn ExchangeApi>, max_attempts: u32) -> Self {
        Self {
            exchange,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The symbol is uppercased here regardless of how the intent was built.
    pub async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult, ExchangeError> {
        let symbol = intent.symbol.trim().to_uppercase();

        let market = match self.exchange.market(&symbol).await {
            Ok(market) => market,
            Err(ExchangeError::Config(msg)) => return Err(ExchangeError::Config(msg)),
            Err(e @ ExchangeError::Network(_)) => {
                warn!(%symbol, error = %e, "Market lookup failed");
                return Ok(OrderResult::unexpected_error(e.to_string()));
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Market lookup rejected");
                return Ok(OrderResult::exchange_error(e.to_string()));
            }
        };

        if !market.active {
            return Ok(OrderResult::exchange_error(format!("{symbol} unavailable")));
        }
        if !market.accepts_amount(intent.amount) {
            return Ok(OrderResult::exchange_error(format!(
                "amount {} below minimum {}",
                intent.amount, market.min_amount
            )));
        }

        let request = OrderRequest {
            symbol,
            side: intent.side,
            amount: intent.amount,
            client_order_id: format!("tp{}", Uuid::new_v4().simple()),
        };

        let mut attempt = 1;
        loop {
            match self.submit(intent, &request).await {
                Ok(ack) => {
                    info!(
                        exchange = self.exchange.name(),
                        order_id = %ack.order_id,
                        symbol = %ack.symbol,
                        executed_qty = ack.executed_qty,
                        exchange_status = %ack.status,
                        attempt,
                        "Order accepted"
                    );
                    return Ok(OrderResult::filled(ack.order_id, ack.symbol, ack.executed_qty));
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(attempt, max_attempts = self.max_attempts, error = %e, "Order submission failed, retrying");
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    warn!(attempts = attempt, error = %e, "Order submission retries exhausted");
                    return Ok(OrderResult::unexpected_error(e.to_string()));
                }
                Err(ExchangeError::Config(msg)) => return Err(ExchangeError::Config(msg)),
                Err(e) => {
                    warn!(client_order_id = %request.client_order_id, error = %e, "Order rejected");
                    return Ok(OrderResult::exchange_error(e.to_string()));
                }
            }
        }
    }

    async fn submit(
        &self,
        intent: &OrderIntent,
        request: &OrderRequest,
    ) -> Result<OrderAck, ExchangeError> {
        match (intent.order_type, intent.price) {
            (OrderType::Limit, Some(price)) => self.exchange.create_limit_order(request, price).await,
            (OrderType::Limit, None) => Err(ExchangeError::Config(
                "limit order without a price".to_string(),
            )),
            (OrderType::Market, _) => self.exchange.create_market_order(request).await,
        }
    }
}
