//! Portfolio aggregation: per-holding and portfolio-level return and risk.
//!
//! Values and P&L use raw closes. Return and risk statistics use adjusted
//! closes, and the value curve is expressed in today's share units.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::error::StonkError;
use crate::domain::gaps::{align_closes, GapPolicy};
use crate::domain::metrics::ReturnMetrics;
use crate::domain::ohlcv::DailyBar;
use crate::domain::position::PortfolioPosition;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingStats {
    pub symbol: String,
    pub quantity: f64,
    pub cost_basis: f64,
    pub last_date: NaiveDate,
    /// The latest bar is older than the portfolio's `as_of` date. A stale
    /// holding's daily move is left out of the portfolio daily figures.
    pub stale: bool,
    pub last_close: f64,
    /// Prior close in today's share units.
    pub previous_close: f64,
    pub market_value: f64,
    pub cost_value: f64,
    pub daily_return: f64,
    pub daily_pnl: f64,
    pub total_pnl: f64,
    /// Total P&L relative to cost; 0 when the cost basis is unknown.
    pub total_return_on_cost: f64,
    pub weight: f64,
    pub metrics: ReturnMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioStats {
    pub holdings: Vec<HoldingStats>,
    /// Positions that had no price data and were left out.
    pub missing: Vec<String>,
    /// Latest bar date across the priced holdings.
    pub as_of: NaiveDate,
    pub total_market_value: f64,
    pub total_cost: f64,
    pub daily_return: f64,
    pub daily_pnl: f64,
    pub total_pnl: f64,
    pub metrics: ReturnMetrics,
    pub value_curve: Vec<ValuePoint>,
}

impl PortfolioStats {
    /// Market-value weights of the priced holdings, in holding order.
    pub fn weights(&self) -> Vec<f64> {
        self.holdings.iter().map(|h| h.weight).collect()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.symbol.clone()).collect()
    }
}

/// Aggregate `positions` using the bars in `prices` (each sorted by date).
/// Positions for the same symbol are merged, quantity-weighting the cost basis.
pub fn aggregate(
    positions: &[PortfolioPosition],
    prices: &HashMap<String, Vec<DailyBar>>,
    policy: GapPolicy,
    risk_free_rate: f64,
) -> Result<PortfolioStats, StonkError> {
    let merged = merge_positions(positions);

    let mut priced: Vec<(&PortfolioPosition, &[DailyBar])> = Vec::new();
    let mut missing = Vec::new();
    for pos in &merged {
        match prices.get(&pos.symbol) {
            Some(bars) if !bars.is_empty() => priced.push((pos, bars.as_slice())),
            _ => missing.push(pos.symbol.clone()),
        }
    }

    if priced.is_empty() {
        return Err(StonkError::NoData {
            symbol: "portfolio".into(),
        });
    }

    let mut holdings: Vec<HoldingStats> = priced
        .iter()
        .map(|(pos, bars)| holding_stats(pos, bars, risk_free_rate))
        .collect();

    let as_of = holdings
        .iter()
        .map(|h| h.last_date)
        .max()
        .ok_or_else(|| StonkError::NoData {
            symbol: "portfolio".into(),
        })?;
    for h in &mut holdings {
        h.stale = h.last_date < as_of;
        if h.stale {
            tracing::debug!(symbol = %h.symbol, last = %h.last_date, %as_of, "stale holding");
        }
    }

    let total_market_value: f64 = holdings.iter().map(|h| h.market_value).sum();
    let total_cost: f64 = holdings.iter().map(|h| h.cost_value).sum();
    let total_pnl: f64 = holdings.iter().map(|h| h.total_pnl).sum();

    let fresh = || holdings.iter().filter(|h| !h.stale);
    let daily_pnl: f64 = fresh().map(|h| h.daily_pnl).sum();
    let previous_value: f64 = fresh().map(|h| h.market_value - h.daily_pnl).sum();
    let daily_return = if previous_value > 0.0 {
        daily_pnl / previous_value
    } else {
        0.0
    };

    for h in &mut holdings {
        h.weight = if total_market_value > 0.0 {
            h.market_value / total_market_value
        } else {
            0.0
        };
    }

    let series: Vec<&[DailyBar]> = priced.iter().map(|(_, bars)| *bars).collect();
    let aligned = align_closes(&series, policy);
    // Adjusted closes rescaled so each holding's latest bar is worth its raw close.
    let units: Vec<f64> = priced
        .iter()
        .map(|(pos, bars)| {
            let last = &bars[bars.len() - 1];
            if last.adj_close > 0.0 {
                pos.quantity * last.close / last.adj_close
            } else {
                pos.quantity
            }
        })
        .collect();
    let value_curve: Vec<ValuePoint> = aligned
        .dates
        .iter()
        .enumerate()
        .map(|(i, &date)| ValuePoint {
            date,
            value: units
                .iter()
                .zip(&aligned.closes)
                .map(|(units, closes)| units * closes[i])
                .sum(),
        })
        .collect();

    let values: Vec<f64> = value_curve.iter().map(|p| p.value).collect();
    let metrics = ReturnMetrics::from_prices(&values, risk_free_rate);

    Ok(PortfolioStats {
        holdings,
        missing,
        as_of,
        total_market_value,
        total_cost,
        daily_return,
        daily_pnl,
        total_pnl,
        metrics,
        value_curve,
    })
}

fn merge_positions(positions: &[PortfolioPosition]) -> Vec<PortfolioPosition> {
    let mut merged: Vec<PortfolioPosition> = Vec::new();
    for pos in positions {
        match merged.iter_mut().find(|m| m.symbol == pos.symbol) {
            Some(existing) => {
                let quantity = existing.quantity + pos.quantity;
                if quantity > 0.0 {
                    existing.cost_basis =
                        (existing.cost_value() + pos.cost_value()) / quantity;
                }
                existing.quantity = quantity;
            }
            None => merged.push(pos.clone()),
        }
    }
    merged
}

fn holding_stats(pos: &PortfolioPosition, bars: &[DailyBar], risk_free_rate: f64) -> HoldingStats {
    // Callers only pass non-empty series.
    let last = &bars[bars.len() - 1];
    let previous_close = if bars.len() > 1 {
        bars[bars.len() - 2].close_in_units_of(last)
    } else {
        last.close
    };

    let market_value = pos.market_value(last.close);
    let cost_value = pos.cost_value();
    let total_pnl = pos.unrealized_pnl(last.close);
    let prices: Vec<f64> = bars.iter().map(DailyBar::return_price).collect();

    HoldingStats {
        symbol: pos.symbol.clone(),
        quantity: pos.quantity,
        cost_basis: pos.cost_basis,
        last_date: last.date,
        stale: false,
        last_close: last.close,
        previous_close,
        market_value,
        cost_value,
        daily_return: if previous_close > 0.0 {
            last.close / previous_close - 1.0
        } else {
            0.0
        },
        daily_pnl: pos.quantity * (last.close - previous_close),
        total_pnl,
        total_return_on_cost: if cost_value > 0.0 {
            total_pnl / cost_value
        } else {
            0.0
        },
        weight: 0.0,
        metrics: ReturnMetrics::from_prices(&prices, risk_free_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bars(symbol: &str, closes: &[f64]) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                symbol: symbol.into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                adj_close: close,
                volume: 1000,
            })
            .collect()
    }

    fn price_map(entries: &[(&str, &[f64])]) -> HashMap<String, Vec<DailyBar>> {
        entries
            .iter()
            .map(|(s, c)| (s.to_string(), bars(s, c)))
            .collect()
    }

    #[test]
    fn single_holding_stats() {
        let prices = price_map(&[("AAPL", &[100.0, 105.0, 110.0])]);
        let positions = vec![PortfolioPosition::new("AAPL", 10.0, 90.0)];
        let stats = aggregate(&positions, &prices, GapPolicy::Drop, 0.0).unwrap();

        let h = &stats.holdings[0];
        assert_relative_eq!(h.market_value, 1100.0);
        assert_relative_eq!(h.cost_value, 900.0);
        assert_relative_eq!(h.total_pnl, 200.0);
        assert_relative_eq!(h.daily_pnl, 50.0);
        assert_relative_eq!(h.daily_return, 110.0 / 105.0 - 1.0);
        assert_relative_eq!(h.total_return_on_cost, 200.0 / 900.0);
        assert_relative_eq!(h.weight, 1.0);
        assert_eq!(stats.value_curve.len(), 3);
        assert_relative_eq!(stats.value_curve[0].value, 1000.0);
    }

    #[test]
    fn two_holdings_aggregate() {
        let prices = price_map(&[
            ("AAPL", &[100.0, 110.0]),
            ("MSFT", &[200.0, 190.0]),
        ]);
        let positions = vec![
            PortfolioPosition::new("AAPL", 10.0, 100.0),
            PortfolioPosition::new("MSFT", 5.0, 200.0),
        ];
        let stats = aggregate(&positions, &prices, GapPolicy::Drop, 0.0).unwrap();

        assert_relative_eq!(stats.total_market_value, 1100.0 + 950.0);
        assert_relative_eq!(stats.total_cost, 2000.0);
        assert_relative_eq!(stats.daily_pnl, 100.0 - 50.0);
        assert_relative_eq!(stats.total_pnl, 50.0);
        assert_relative_eq!(stats.daily_return, 50.0 / 2000.0);
        assert_relative_eq!(stats.metrics.total_return, 2050.0 / 2000.0 - 1.0);

        let weight_sum: f64 = stats.weights().iter().sum();
        assert_relative_eq!(weight_sum, 1.0, epsilon = 1e-12);
        assert_eq!(stats.symbols(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn missing_prices_are_reported() {
        let prices = price_map(&[("AAPL", &[100.0, 101.0])]);
        let positions = vec![
            PortfolioPosition::new("AAPL", 1.0, 100.0),
            PortfolioPosition::new("GONE", 1.0, 10.0),
        ];
        let stats = aggregate(&positions, &prices, GapPolicy::Drop, 0.0).unwrap();
        assert_eq!(stats.missing, vec!["GONE"]);
        assert_eq!(stats.holdings.len(), 1);
    }

    #[test]
    fn no_priced_holdings_is_an_error() {
        let prices = HashMap::new();
        let positions = vec![PortfolioPosition::new("GONE", 1.0, 10.0)];
        assert!(matches!(
            aggregate(&positions, &prices, GapPolicy::Drop, 0.0),
            Err(StonkError::NoData { .. })
        ));
    }

    #[test]
    fn stale_holding_is_left_out_of_daily_figures() {
        let mut prices = price_map(&[("AAPL", &[100.0, 100.0])]);
        let mut msft = bars("MSFT", &[100.0, 200.0]);
        for (bar, day) in msft.iter_mut().zip([1, 2]) {
            bar.date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        }
        prices.insert("MSFT".into(), msft);
        let positions = vec![
            PortfolioPosition::new("AAPL", 1.0, 100.0),
            PortfolioPosition::new("MSFT", 1.0, 100.0),
        ];
        let stats = aggregate(&positions, &prices, GapPolicy::Drop, 0.0).unwrap();

        assert_eq!(stats.as_of, NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
        assert!(!stats.holdings[0].stale);
        assert!(stats.holdings[1].stale);
        assert_relative_eq!(stats.holdings[1].daily_pnl, 100.0);
        assert_relative_eq!(stats.daily_pnl, 0.0);
        assert_relative_eq!(stats.daily_return, 0.0);
        assert_relative_eq!(stats.total_market_value, 300.0);
        assert!(stats.value_curve.is_empty());
    }

    #[test]
    fn split_keeps_holding_returns_and_pnl_consistent() {
        let mut prices = price_map(&[("NVDA", &[100.0, 101.0, 50.5, 51.0])]);
        let nvda = prices.get_mut("NVDA").unwrap();
        nvda[0].adj_close = 50.0;
        nvda[1].adj_close = 50.5;
        let positions = vec![PortfolioPosition::new("NVDA", 20.0, 45.0)];
        let stats = aggregate(&positions, &prices, GapPolicy::Drop, 0.0).unwrap();

        let h = &stats.holdings[0];
        assert_relative_eq!(h.market_value, 1020.0);
        assert_relative_eq!(h.daily_pnl, 20.0 * 0.5, epsilon = 1e-9);
        assert_relative_eq!(h.metrics.total_return, 0.02, epsilon = 1e-12);
        assert_relative_eq!(stats.metrics.total_return, 0.02, epsilon = 1e-12);
        assert_relative_eq!(stats.value_curve[0].value, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(stats.value_curve[3].value, 1020.0, epsilon = 1e-9);
    }

    #[test]
    fn duplicate_positions_merge() {
        let prices = price_map(&[("AAPL", &[100.0, 100.0])]);
        let positions = vec![
            PortfolioPosition::new("AAPL", 10.0, 80.0),
            PortfolioPosition::new("AAPL", 10.0, 120.0),
        ];
        let stats = aggregate(&positions, &prices, GapPolicy::Drop, 0.0).unwrap();
        assert_eq!(stats.holdings.len(), 1);
        assert_relative_eq!(stats.holdings[0].quantity, 20.0);
        assert_relative_eq!(stats.holdings[0].cost_basis, 100.0);
    }
}
