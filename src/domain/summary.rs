//! Key statistics for one instrument's price series.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::StonkError;
use crate::domain::metrics::{mean, ReturnMetrics};
use crate::domain::ohlcv::DailyBar;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub symbol: String,
    pub current_price: f64,
    /// Prior close in today's share units.
    pub previous_close: f64,
    pub daily_change: f64,
    pub daily_change_pct: f64,
    pub period_return_pct: f64,
    pub annualized_return_pct: f64,
    pub annualized_volatility_pct: f64,
    pub latest_volume: i64,
    pub average_volume: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub bar_count: usize,
}

impl SeriesSummary {
    /// `bars` must be sorted by date. Price levels are raw closes; returns and
    /// volatility use adjusted closes.
    pub fn compute(symbol: &str, bars: &[DailyBar]) -> Result<Self, StonkError> {
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(StonkError::NoData {
                symbol: symbol.to_string(),
            });
        };

        let current_price = last.close;
        let previous_close = if bars.len() > 1 {
            bars[bars.len() - 2].close_in_units_of(last)
        } else {
            current_price
        };
        let daily_change = current_price - previous_close;
        let daily_change_pct = if previous_close != 0.0 {
            daily_change / previous_close * 100.0
        } else {
            0.0
        };

        let prices: Vec<f64> = bars.iter().map(DailyBar::return_price).collect();
        let metrics = ReturnMetrics::from_prices(&prices, 0.0);

        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        Ok(SeriesSummary {
            symbol: symbol.to_string(),
            current_price,
            previous_close,
            daily_change,
            daily_change_pct,
            period_return_pct: metrics.total_return * 100.0,
            annualized_return_pct: metrics.annualized_return * 100.0,
            annualized_volatility_pct: metrics.annualized_volatility * 100.0,
            latest_volume: last.volume,
            average_volume: mean(&volumes),
            first_date: first.date,
            last_date: last.date,
            bar_count: bars.len(),
        })
    }
}
