//! Return and risk statistics over a price or value series.

use serde::Serialize;

use crate::domain::gaps::simple_returns;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample covariance (n - 1 denominator); 0 for fewer than two observations.
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mx = mean(&xs[..n]);
    let my = mean(&ys[..n]);
    xs[..n]
        .iter()
        .zip(&ys[..n])
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(xs: &[f64]) -> f64 {
    sample_covariance(xs, xs).max(0.0).sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnMetrics {
    /// last / first - 1
    pub total_return: f64,
    /// Mean daily simple return x 252.
    pub annualized_return: f64,
    /// Compound annual growth rate over the covered trading days.
    pub cagr: f64,
    /// Sample std of daily returns x sqrt(252).
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
}

impl ReturnMetrics {
    pub fn from_prices(prices: &[f64], risk_free_rate: f64) -> Self {
        let first = prices.first().copied().unwrap_or(0.0);
        let last = prices.last().copied().unwrap_or(0.0);

        let total_return = if first > 0.0 { last / first - 1.0 } else { 0.0 };

        let returns = simple_returns(prices);
        let annualized_return = mean(&returns) * TRADING_DAYS_PER_YEAR;
        let annualized_volatility = sample_std(&returns) * TRADING_DAYS_PER_YEAR.sqrt();

        let years = returns.len() as f64 / TRADING_DAYS_PER_YEAR;
        let cagr = if years > 0.0 && first > 0.0 && last > 0.0 {
            (last / first).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let sharpe_ratio = if annualized_volatility > 0.0 {
            (annualized_return - risk_free_rate) / annualized_volatility
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(prices);

        ReturnMetrics {
            total_return,
            annualized_return,
            cagr,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
        }
    }
}

/// Largest peak-to-trough decline as a fraction, and the longest run of
/// observations spent below a prior peak.
fn compute_drawdown(values: &[f64]) -> (f64, i64) {
    let Some(&first) = values.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for &value in values {
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}
