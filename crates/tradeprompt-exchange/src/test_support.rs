//! In-memory [`ExchangeApi`] for gateway and handler tests.
//!
//! `MockExchange` serves a configurable market and replays scripted
//! submission results, recording every order it sees.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tradeprompt_models::MarketInfo;

use crate::api::{ExchangeApi, OrderAck, OrderRequest};
use crate::error::ExchangeError;

pub struct MockExchange {
    market: Result<MarketInfo, ExchangeError>,
    submissions: Mutex<VecDeque<Result<OrderAck, ExchangeError>>>,
    market_calls: AtomicUsize,
    market_orders: AtomicUsize,
    limit_orders: AtomicUsize,
    requests: Mutex<Vec<OrderRequest>>,
    last_price: Mutex<Option<f64>>,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchange {
    /// An active market with no minimum that fills every order in full.
    pub fn new() -> Self {
        Self {
            market: Ok(MarketInfo {
                symbol: String::new(),
                active: true,
                min_amount: 0.0,
            }),
            submissions: Mutex::new(VecDeque::new()),
            market_calls: AtomicUsize::new(0),
            market_orders: AtomicUsize::new(0),
            limit_orders: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            last_price: Mutex::new(None),
        }
    }

    pub fn ack(order_id: &str, symbol: &str, executed_qty: f64) -> OrderAck {
        OrderAck {
            order_id: order_id.to_string(),
            symbol: symbol.to_string(),
            executed_qty,
            status: "FILLED".to_string(),
        }
    }

    pub fn with_min_amount(mut self, min_amount: f64) -> Self {
        if let Ok(market) = &mut self.market {
            market.min_amount = min_amount;
        }
        self
    }

    pub fn inactive(mut self) -> Self {
        if let Ok(market) = &mut self.market {
            market.active = false;
        }
        self
    }

    pub fn with_market(mut self, market: Result<MarketInfo, ExchangeError>) -> Self {
        self.market = market;
        self
    }

    /// Submission results in call order. The last one repeats.
    pub fn with_submissions(self, results: Vec<Result<OrderAck, ExchangeError>>) -> Self {
        Self {
            submissions: Mutex::new(results.into()),
            ..self
        }
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn market_orders(&self) -> usize {
        self.market_orders.load(Ordering::SeqCst)
    }

    pub fn limit_orders(&self) -> usize {
        self.limit_orders.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.market_orders() + self.limit_orders()
    }

    pub fn last_request(&self) -> Option<OrderRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price.lock().ok().and_then(|p| *p)
    }

    pub fn client_order_ids(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.iter().map(|o| o.client_order_id.clone()).collect())
            .unwrap_or_default()
    }

    fn next_submission(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(order.clone());
        }

        let mut queue = self
            .submissions
            .lock()
            .map_err(|_| ExchangeError::Config("mock submissions poisoned".to_string()))?;
        match queue.len() {
            0 => Ok(Self::ack("1", &order.symbol, order.amount)),
            1 => queue[0].clone(),
            _ => queue
                .pop_front()
                .unwrap_or_else(|| Ok(Self::ack("1", &order.symbol, order.amount))),
        }
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    fn name(&self) -> &str {
        "mock"
    }

    async fn market(&self, symbol: &str) -> Result<MarketInfo, ExchangeError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        self.market.clone().map(|market| MarketInfo {
            symbol: symbol.to_string(),
            ..market
        })
    }

    async fn create_market_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        self.market_orders.fetch_add(1, Ordering::SeqCst);
        self.next_submission(order)
    }

    async fn create_limit_order(
        &self,
        order: &OrderRequest,
        price: f64,
    ) -> Result<OrderAck, ExchangeError> {
        self.limit_orders.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_price.lock() {
            *last = Some(price);
        }
        self.next_submission(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradeprompt_models::OrderSide;

    #[tokio::test]
    async fn echoes_order_when_unscripted() {
        let mock = MockExchange::new();
        let order = OrderRequest {
            symbol: "ETHUSDT".to_string(),
            side: OrderSide::Sell,
            amount: 0.5,
            client_order_id: "tpabc".to_string(),
        };

        let ack = mock.create_market_order(&order).await.unwrap();

        assert_eq!(ack, MockExchange::ack("1", "ETHUSDT", 0.5));
        assert_eq!(mock.last_request(), Some(order));
        assert_eq!(mock.market("ETHUSDT").await.unwrap().symbol, "ETHUSDT");
        assert_eq!(mock.market_calls(), 1);
    }
}
