use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use tradeprompt_agents::{parse_order_intent, CompletionClient, CompletionError};
use tradeprompt_exchange::OrderGateway;
use tradeprompt_models::{OrderIntent, OrderResult, PromptRequest, MAX_BODY_BYTES};
use uuid::Uuid;

use crate::error::ApiError;

/// Successful `/strategy/ask` body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StrategyResponse {
    pub strategy: OrderIntent,
    pub order_result: OrderResult,
}

/// Runs one prompt through completion, intent parsing and order placement.
///
/// Input limits are checked before any outbound call.
pub struct StrategyHandler {
    completion: Arc<dyn CompletionClient>,
    gateway: Arc<OrderGateway>,
}

impl StrategyHandler {
    pub fn new(completion: Arc<dyn CompletionClient>, gateway: Arc<OrderGateway>) -> Self {
        Self {
            completion,
            gateway,
        }
    }

    pub async fn handle(&self, body: &[u8]) -> Result<StrategyResponse, ApiError> {
        let request_id = Uuid::new_v4();
        self.process(body)
            .instrument(info_span!("strategy_ask", %request_id))
            .await
    }

    async fn process(&self, body: &[u8]) -> Result<StrategyResponse, ApiError> {
        if body.len() > MAX_BODY_BYTES {
            warn!(bytes = body.len(), limit = MAX_BODY_BYTES, "Payload too large");
            return Err(ApiError::payload_too_large());
        }

        let request = parse_body(body)?;
        let prompt = request.sanitized_prompt();
        if prompt.is_empty() {
            warn!("Empty prompt");
            return Err(ApiError::bad_request("Empty prompt"));
        }

        let raw = self.completion.ask(&prompt).await.map_err(|e| {
            match &e {
                CompletionError::Config(_) => error!(error = %e, "Completion client misconfigured"),
                _ => warn!(error = %e, kind = e.kind(), "Completion failed"),
            }
            ApiError::completion(&e)
        })?;

        let strategy = parse_order_intent(&raw).map_err(|e| {
            warn!(model = self.completion.model(), error = %e, raw = %raw, "Invalid strategy");
            ApiError::invalid_strategy(&e)
        })?;
        info!(
            symbol = %strategy.symbol,
            side = %strategy.side,
            amount = strategy.amount,
            order_type = %strategy.order_type,
            "Strategy parsed"
        );

        let order_result = self.gateway.place_order(&strategy).await.map_err(|e| {
            error!(error = %e, symbol = %strategy.symbol, "Order execution failed");
            ApiError::internal(format!("Order execution failed: {e}"))
        })?;

        if let Some(kind) = order_result.failure_kind() {
            warn!(symbol = %strategy.symbol, ?kind, "Order not filled");
        }

        Ok(StrategyResponse {
            strategy,
            order_result,
        })
    }
}

/// The body must be a JSON object; its `prompt` may be any JSON value.
fn parse_body(body: &[u8]) -> Result<PromptRequest, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Malformed request body");
        ApiError::bad_request("Invalid JSON body")
    })?;
    if !value.is_object() {
        warn!("Request body is not a JSON object");
        return Err(ApiError::bad_request("Invalid JSON body"));
    }
    serde_json::from_value(value).map_err(|_| ApiError::bad_request("Invalid JSON body"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tradeprompt_agents::test_support::ScriptedCompletion;
    use tradeprompt_exchange::test_support::MockExchange;
    use tradeprompt_models::{OrderSide, OrderType};

    const INTENT: &str = r#"{"symbol":"btcusdt","side":"BUY","amount":"0.01","type":"Market"}"#;

    fn handler(
        completion: &Arc<ScriptedCompletion>,
        exchange: &Arc<MockExchange>,
    ) -> StrategyHandler {
        StrategyHandler::new(
            completion.clone(),
            Arc::new(OrderGateway::new(exchange.clone(), 3)),
        )
    }

    #[tokio::test]
    async fn normalizes_and_fills() {
        let completion = Arc::new(ScriptedCompletion::replying(INTENT));
        let exchange = Arc::new(MockExchange::new());

        let response = handler(&completion, &exchange)
            .handle(br#"{"prompt": "  buy a bit of bitcoin  "}"#)
            .await
            .unwrap();

        assert_eq!(response.strategy.symbol, "BTCUSDT");
        assert_eq!(response.strategy.side, OrderSide::Buy);
        assert_eq!(response.strategy.order_type, OrderType::Market);
        assert_eq!(response.strategy.amount, 0.01);
        assert!(response.order_result.is_filled());
        assert_eq!(completion.prompts(), vec!["buy a bit of bitcoin"]);
    }

    #[tokio::test]
    async fn oversized_body_skips_all_calls() {
        let completion = Arc::new(ScriptedCompletion::replying(INTENT));
        let exchange = Arc::new(MockExchange::new());
        let body = format!(r#"{{"prompt":"{}"}}"#, "x".repeat(MAX_BODY_BYTES));

        let err = handler(&completion, &exchange)
            .handle(body.as_bytes())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(completion.calls(), 0);
        assert_eq!(exchange.market_calls(), 0);
    }

    #[tokio::test]
    async fn whitespace_prompt_is_empty() {
        let completion = Arc::new(ScriptedCompletion::replying(INTENT));
        let exchange = Arc::new(MockExchange::new());

        let err = handler(&completion, &exchange)
            .handle(br#"{"prompt": " \n\t "}"#)
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "Empty prompt");
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn array_body_is_rejected() {
        let completion = Arc::new(ScriptedCompletion::replying(INTENT));
        let exchange = Arc::new(MockExchange::new());

        let err = handler(&completion, &exchange)
            .handle(br#"["buy btc"]"#)
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.detail, "Invalid JSON body");
    }

    #[tokio::test]
    async fn missing_side_never_reaches_gateway() {
        let completion = Arc::new(ScriptedCompletion::replying(
            r#"{"symbol":"BTCUSDT","amount":0.01,"type":"market"}"#,
        ));
        let exchange = Arc::new(MockExchange::new());

        let err = handler(&completion, &exchange)
            .handle(br#"{"prompt":"buy"}"#)
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.detail.contains("side"));
        assert_eq!(exchange.market_calls(), 0);
    }

    #[tokio::test]
    async fn completion_failure_propagates_status() {
        let completion = Arc::new(ScriptedCompletion::failing(CompletionError::Network(
            "HTTP 500: boom".into(),
        )));
        let exchange = Arc::new(MockExchange::new());

        let err = handler(&completion, &exchange)
            .handle(br#"{"prompt":"buy"}"#)
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.kind, Some("NETWORK_ERROR"));
        assert_eq!(exchange.market_calls(), 0);
    }

    #[tokio::test]
    async fn gateway_failure_results_are_returned() {
        let completion = Arc::new(ScriptedCompletion::replying(INTENT));
        let exchange = Arc::new(MockExchange::new().inactive());

        let response = handler(&completion, &exchange)
            .handle(br#"{"prompt":"buy"}"#)
            .await
            .unwrap();

        assert_eq!(
            response.order_result,
            OrderResult::exchange_error("BTCUSDT unavailable")
        );
    }
}
