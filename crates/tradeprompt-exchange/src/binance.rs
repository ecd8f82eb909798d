use std::fmt;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};
use tradeprompt_models::{ExchangeConfig, MarketInfo, OrderSide};

use crate::api::{ExchangeApi, OrderAck, OrderRequest};
use crate::error::ExchangeError;
use crate::throttle::Throttle;

type HmacSha256 = Hmac<Sha256>;

const EXCHANGE_INFO_PATH: &str = "/api/v3/exchangeInfo";
const ORDER_PATH: &str = "/api/v3/order";
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// API key pair for signed endpoints.
#[derive(Clone)]
pub struct BinanceCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for BinanceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceCredentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    #[serde(default)]
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    status: String,
    #[serde(default = "default_true")]
    is_spot_trading_allowed: bool,
    #[serde(default)]
    filters: Vec<SymbolFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolFilter {
    filter_type: String,
    #[serde(default)]
    min_qty: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrderResponse {
    symbol: String,
    order_id: i64,
    #[serde(default)]
    executed_qty: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    msg: String,
}

fn default_true() -> bool {
    true
}

/// Binance spot REST client.
///
/// Market metadata comes from the public `exchangeInfo` endpoint; orders go
/// through the HMAC-signed `order` endpoint. All requests share one throttle.
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<BinanceCredentials>,
    recv_window_ms: u64,
    throttle: Throttle,
    verbose: bool,
}

impl BinanceClient {
    pub fn new(
        config: &ExchangeConfig,
        credentials: Option<BinanceCredentials>,
    ) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExchangeError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            recv_window_ms: config.recv_window_ms,
            throttle: Throttle::new(config.min_request_interval()),
            verbose: config.verbose,
        })
    }

    /// `BTC/USDT` and `btcusdt` both become `BTCUSDT`.
    pub fn rest_symbol(symbol: &str) -> String {
        symbol.replace('/', "").to_uppercase()
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ExchangeError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ExchangeError::Config(format!("Invalid exchange URL: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn public_get(&self, path: &str, params: &[(&str, String)]) -> Result<String, ExchangeError> {
        let url = self.url(path, params)?;
        self.throttle.wait().await;
        self.send(Method::GET, url, None).await
    }

    /// Sign `params` plus `recvWindow`/`timestamp` and send them as the query string.
    async fn signed(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<String, ExchangeError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ExchangeError::Config("exchange API credentials not configured".to_string())
        })?;

        // The timestamp is taken after the throttle slot is granted.
        self.throttle.wait().await;

        let mut all = params.to_vec();
        all.push(("recvWindow", self.recv_window_ms.to_string()));
        all.push(("timestamp", chrono::Utc::now().timestamp_millis().to_string()));

        let mut url = self.url(path, &all)?;
        let payload = url.query().unwrap_or_default().to_string();
        let signature = sign(&credentials.api_secret, &payload)?;
        url.query_pairs_mut().append_pair("signature", &signature);

        self.send(method, url, Some(&credentials.api_key)).await
    }

    /// Callers must already hold a throttle slot.
    async fn send(
        &self,
        method: Method,
        url: Url,
        api_key: Option<&str>,
    ) -> Result<String, ExchangeError> {
        if self.verbose {
            debug!(method = %method, path = url.path(), query = %redacted_query(&url), "Exchange request");
        }

        let mut request = self.client.request(method, url);
        if let Some(key) = api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                ExchangeError::Config(e.to_string())
            } else {
                ExchangeError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        if self.verbose {
            debug!(status = status.as_u16(), body = %body, "Exchange response");
        }

        if status.is_success() {
            return Ok(body);
        }
        Err(classify_failure(status, &body))
    }

    async fn submit(
        &self,
        order: &OrderRequest,
        mut params: Vec<(&str, String)>,
    ) -> Result<OrderAck, ExchangeError> {
        let symbol = Self::rest_symbol(&order.symbol);
        let mut all = vec![
            ("symbol", symbol),
            ("side", side_param(order.side).to_string()),
        ];
        all.append(&mut params);
        all.push(("quantity", order.amount.to_string()));
        all.push(("newClientOrderId", order.client_order_id.clone()));
        all.push(("newOrderRespType", "RESULT".to_string()));

        let body = self.signed(Method::POST, ORDER_PATH, &all).await?;
        parse_order_ack(&body)
    }
}

fn side_param(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "BUY",
        OrderSide::Sell => "SELL",
    }
}

/// Hex-encoded HMAC-SHA256 of `payload`.
fn sign(secret: &str, payload: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Config(format!("HMAC error: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn redacted_query(url: &Url) -> String {
    url.query_pairs()
        .map(|(k, v)| {
            if k == "signature" {
                format!("{k}=<redacted>")
            } else {
                format!("{k}={v}")
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// 5xx, 418 and 429 are transient; everything else is a rejection.
fn classify_failure(status: StatusCode, body: &str) -> ExchangeError {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::IM_A_TEAPOT
    {
        return ExchangeError::Network(format!("HTTP {}: {}", status.as_u16(), body.trim()));
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => ExchangeError::Rejected {
            code: err.code,
            message: err.msg,
        },
        Err(_) => ExchangeError::Rejected {
            code: i64::from(status.as_u16()),
            message: body.trim().to_string(),
        },
    }
}

fn parse_market(symbol: &str, body: &str) -> Result<MarketInfo, ExchangeError> {
    let info: ExchangeInfo = serde_json::from_str(body)
        .map_err(|e| ExchangeError::Decode(format!("exchangeInfo: {e}")))?;

    let wanted = BinanceClient::rest_symbol(symbol);
    let entry = info
        .symbols
        .into_iter()
        .find(|s| s.symbol == wanted)
        .ok_or_else(|| ExchangeError::Decode(format!("{symbol} missing from exchangeInfo")))?;

    let min_amount = match entry
        .filters
        .iter()
        .find(|f| f.filter_type == "LOT_SIZE")
        .and_then(|f| f.min_qty.as_deref())
    {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|e| ExchangeError::Decode(format!("LOT_SIZE minQty {raw:?}: {e}")))?,
        None => 0.0,
    };

    Ok(MarketInfo {
        symbol: symbol.to_string(),
        active: entry.status == "TRADING" && entry.is_spot_trading_allowed,
        min_amount,
    })
}

fn parse_order_ack(body: &str) -> Result<OrderAck, ExchangeError> {
    let response: NewOrderResponse = serde_json::from_str(body)
        .map_err(|e| ExchangeError::Decode(format!("order response: {e}")))?;

    let executed_qty = match response.executed_qty.as_deref() {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|e| ExchangeError::Decode(format!("executedQty {raw:?}: {e}")))?,
        None => 0.0,
    };

    Ok(OrderAck {
        order_id: response.order_id.to_string(),
        symbol: response.symbol,
        executed_qty,
        status: response.status.unwrap_or_default(),
    })
}

#[async_trait]
impl ExchangeApi for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn market(&self, symbol: &str) -> Result<MarketInfo, ExchangeError> {
        let body = self
            .public_get(EXCHANGE_INFO_PATH, &[("symbol", Self::rest_symbol(symbol))])
            .await?;
        let market = parse_market(symbol, &body)?;
        if !market.active {
            warn!(symbol, "Market is not trading");
        }
        Ok(market)
    }

    async fn create_market_order(&self, order: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        self.submit(order, vec![("type", "MARKET".to_string())]).await
    }

    async fn create_limit_order(
        &self,
        order: &OrderRequest,
        price: f64,
    ) -> Result<OrderAck, ExchangeError> {
        self.submit(
            order,
            vec![
                ("type", "LIMIT".to_string()),
                ("timeInForce", "GTC".to_string()),
                ("price", price.to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_symbol_strips_separator() {
        assert_eq!(BinanceClient::rest_symbol("btc/usdt"), "BTCUSDT");
        assert_eq!(BinanceClient::rest_symbol("ETHUSDT"), "ETHUSDT");
    }

    #[test]
    fn signature_matches_binance_reference() {
        // Example from the Binance REST API documentation.
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let payload = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign(secret, payload).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn parse_market_reads_status_and_lot_size() {
        let body = r#"{
            "timezone": "UTC",
            "symbols": [{
                "symbol": "BTCUSDT",
                "status": "TRADING",
                "isSpotTradingAllowed": true,
                "filters": [
                    {"filterType": "PRICE_FILTER", "minPrice": "0.01000000"},
                    {"filterType": "LOT_SIZE", "minQty": "0.00100000", "maxQty": "9000.00000000", "stepSize": "0.00001000"}
                ]
            }]
        }"#;

        let market = parse_market("BTCUSDT", body).unwrap();
        assert!(market.active);
        assert_eq!(market.min_amount, 0.001);
    }

    #[test]
    fn parse_market_halted_symbol_is_inactive() {
        let body = r#"{"symbols":[{"symbol":"LUNAUSDT","status":"BREAK","filters":[]}]}"#;
        let market = parse_market("LUNAUSDT", body).unwrap();
        assert!(!market.active);
        assert_eq!(market.min_amount, 0.0);
    }

    #[test]
    fn parse_market_missing_symbol() {
        let body = r#"{"symbols":[]}"#;
        assert!(matches!(
            parse_market("BTCUSDT", body),
            Err(ExchangeError::Decode(_))
        ));
    }

    #[test]
    fn parse_order_ack_result_response() {
        let body = r#"{
            "symbol": "BTCUSDT", "orderId": 28, "orderListId": -1,
            "clientOrderId": "tp6gCrw2kRUAF9CvJDGP16IP", "transactTime": 1507725176595,
            "price": "0.00000000", "origQty": "0.01000000", "executedQty": "0.01000000",
            "status": "FILLED", "timeInForce": "GTC", "type": "MARKET", "side": "BUY"
        }"#;

        let ack = parse_order_ack(body).unwrap();
        assert_eq!(ack.order_id, "28");
        assert_eq!(ack.executed_qty, 0.01);
        assert_eq!(ack.status, "FILLED");
    }

    #[test]
    fn classify_server_and_rate_limit_errors_as_network() {
        for status in [500, 502, 503, 418, 429] {
            let status = StatusCode::from_u16(status).unwrap();
            assert!(classify_failure(status, "").is_transient(), "{status}");
        }
    }

    #[test]
    fn classify_binance_error_body_as_rejection() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"code":-2010,"msg":"Account has insufficient balance for requested action."}"#,
        );
        assert_eq!(
            err,
            ExchangeError::Rejected {
                code: -2010,
                message: "Account has insufficient balance for requested action.".to_string()
            }
        );
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = BinanceCredentials {
            api_key: "public-key".to_string(),
            api_secret: "very-secret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("public-key"));
    }

    #[tokio::test]
    async fn orders_require_credentials() {
        let client = BinanceClient::new(&ExchangeConfig::default(), None).unwrap();
        let order = OrderRequest {
            symbol: "BTCUSDT".to_string(),
            side: OrderSide::Buy,
            amount: 0.01,
            client_order_id: "tp1".to_string(),
        };

        let err = client.create_market_order(&order).await.unwrap_err();
        assert!(matches!(err, ExchangeError::Config(_)));
    }
}
