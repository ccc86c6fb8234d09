//! Instrument metadata.

use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_MARKET: &str = "UNKNOWN";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instrument {
    pub symbol: String,
    pub market: String,
    pub currency: String,
    pub first_seen: NaiveDate,
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        market: impl Into<String>,
        currency: impl Into<String>,
        first_seen: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            market: market.into(),
            currency: currency.into(),
            first_seen,
        }
    }

    /// Placeholder used when the data source has no metadata for a symbol.
    pub fn unknown(symbol: impl Into<String>, first_seen: NaiveDate) -> Self {
        Self::new(symbol, DEFAULT_MARKET, DEFAULT_CURRENCY, first_seen)
    }

    /// True when `other` carries different market or currency metadata.
    pub fn metadata_differs(&self, other: &Instrument) -> bool {
        self.market != other.market || self.currency != other.currency
    }
}
