use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Filled,
}

/// A successful order submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fill {
    pub status: FillStatus,
    pub order_id: String,
    pub symbol: String,
    pub executed_qty: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The exchange refused the order, or it failed market validation.
    ExchangeError,
    /// Anything else, including exhausted network retries.
    UnexpectedError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderFailure {
    pub error: FailureKind,
    pub details: String,
}

/// Terminal outcome of an order attempt, returned to the HTTP caller as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OrderResult {
    Filled(Fill),
    Failed(OrderFailure),
}

impl OrderResult {
    pub fn filled(order_id: impl Into<String>, symbol: impl Into<String>, executed_qty: f64) -> Self {
        OrderResult::Filled(Fill {
            status: FillStatus::Filled,
            order_id: order_id.into(),
            symbol: symbol.into(),
            executed_qty,
        })
    }

    pub fn exchange_error(details: impl Into<String>) -> Self {
        OrderResult::Failed(OrderFailure {
            error: FailureKind::ExchangeError,
            details: details.into(),
        })
    }

    pub fn unexpected_error(details: impl Into<String>) -> Self {
        OrderResult::Failed(OrderFailure {
            error: FailureKind::UnexpectedError,
            details: details.into(),
        })
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, OrderResult::Filled(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            OrderResult::Filled(_) => None,
            OrderResult::Failed(f) => Some(f.error),
        }
    }
}
