//! Portfolio positions as configured by the user.

use serde::Serialize;

use crate::domain::error::StonkError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioPosition {
    pub symbol: String,
    pub quantity: f64,
    /// Per-share price paid.
    pub cost_basis: f64,
}

impl PortfolioPosition {
    pub fn new(symbol: impl Into<String>, quantity: f64, cost_basis: f64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            cost_basis,
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn cost_value(&self) -> f64 {
        self.quantity * self.cost_basis
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.cost_basis)
    }

    /// Parse a `SYMBOL:QUANTITY[:COST_BASIS]` entry. A missing cost basis is 0.
    pub fn parse(entry: &str) -> Result<Self, StonkError> {
        let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(StonkError::invalid_input(format!(
                "position '{entry}' must be SYMBOL:QUANTITY[:COST_BASIS]"
            )));
        }

        let symbol = parts[0].to_uppercase();
        if symbol.is_empty() {
            return Err(StonkError::invalid_input(format!(
                "position '{entry}' has an empty symbol"
            )));
        }

        let quantity: f64 = parts[1].parse().map_err(|_| {
            StonkError::invalid_input(format!("position '{entry}' has an invalid quantity"))
        })?;
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(StonkError::invalid_input(format!(
                "position '{entry}' quantity must be positive"
            )));
        }

        let cost_basis: f64 = match parts.get(2) {
            Some(raw) => raw.parse().map_err(|_| {
                StonkError::invalid_input(format!("position '{entry}' has an invalid cost basis"))
            })?,
            None => 0.0,
        };
        if !cost_basis.is_finite() || cost_basis < 0.0 {
            return Err(StonkError::invalid_input(format!(
                "position '{entry}' cost basis must be non-negative"
            )));
        }

        Ok(Self::new(symbol, quantity, cost_basis))
    }
}
