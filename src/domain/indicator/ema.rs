//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars produce nothing.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

pub fn calculate_ema(bars: &[DailyBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < period {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let mut values = Vec::with_capacity(bars.len() - period + 1);
    let k = 2.0 / (period as f64 + 1.0);

    let mut ema = bars[..period].iter().map(|b| b.close).sum::<f64>() / period as f64;
    values.push(IndicatorPoint {
        date: bars[period - 1].date,
        value: ema,
    });

    for bar in &bars[period..] {
        ema = bar.close * k + ema * (1.0 - k);
        values.push(IndicatorPoint {
            date: bar.date,
            value: ema,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}
