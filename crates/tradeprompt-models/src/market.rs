use serde::{Deserialize, Serialize};

/// Exchange metadata for one symbol, fetched fresh for every order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketInfo {
    pub symbol: String,
    pub active: bool,
    /// Smallest tradable base-asset quantity.
    pub min_amount: f64,
}

impl MarketInfo {
    pub fn accepts_amount(&self, amount: f64) -> bool {
        amount >= self.min_amount
    }
}
