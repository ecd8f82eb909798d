use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fields an order intent must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["symbol", "side", "amount", "type"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntentError {
    #[error("{0}")]
    InvalidJson(String),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A structured trading instruction parsed from the model's reply.
///
/// Always normalized: `symbol` upper-case, `side` and `type` lower-case,
/// `amount` positive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub amount: f64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OrderIntent {
    /// Validate and normalize a parsed JSON object into an intent.
    ///
    /// Every missing required field is reported at once. `amount` and `price`
    /// accept JSON numbers or numeric strings.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, IntentError> {
        let obj = value.as_object().ok_or(IntentError::NotAnObject)?;

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !obj.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(IntentError::MissingFields(missing));
        }

        let symbol = text_field(obj, "symbol")?.to_uppercase();
        if symbol.is_empty() {
            return Err(invalid("symbol", "must not be empty"));
        }

        let side = match text_field(obj, "side")?.to_lowercase().as_str() {
            "buy" => OrderSide::Buy,
            "sell" => OrderSide::Sell,
            other => return Err(invalid("side", format!("expected buy or sell, got {other:?}"))),
        };

        let order_type = match text_field(obj, "type")?.to_lowercase().as_str() {
            "market" => OrderType::Market,
            "limit" => OrderType::Limit,
            other => {
                return Err(invalid("type", format!("expected market or limit, got {other:?}")))
            }
        };

        let amount = positive_number(obj, "amount")?;

        let price = match obj.get("price") {
            None | Some(serde_json::Value::Null) => None,
            Some(_) => Some(positive_number(obj, "price")?),
        };

        if order_type == OrderType::Limit && price.is_none() {
            return Err(invalid("price", "limit orders require a price"));
        }

        Ok(Self {
            symbol,
            side,
            amount,
            order_type,
            price,
        })
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> IntentError {
    IntentError::InvalidField {
        field,
        reason: reason.into(),
    }
}

fn text_field<'a>(
    obj: &'a serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<&'a str, IntentError> {
    obj.get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .ok_or_else(|| invalid(field, "must be a string"))
}

fn positive_number(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &'static str,
) -> Result<f64, IntentError> {
    let parsed = match obj.get(field) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() && n > 0.0 => Ok(n),
        Some(n) => Err(invalid(field, format!("must be a positive number, got {n}"))),
        None => Err(invalid(field, "could not convert to a number")),
    }
}
