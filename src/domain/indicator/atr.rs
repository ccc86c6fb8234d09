//! Average True Range and the ATR stop line.
//!
//! TR[0] = high - low, TR[i] = true_range(prev close). ATR is seeded with
//! the mean of the first n TRs, then Wilder-smoothed:
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.
//! The stop line trails price by a multiple of ATR: close - m * ATR.
//! Warmup: first (n-1) bars produce nothing.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

pub const DEFAULT_ATR_MULTIPLIER: f64 = 2.0;

pub fn calculate_atr(bars: &[DailyBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() < period {
        return IndicatorSeries::empty(IndicatorType::Atr(period));
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut atr = tr_values[..period].iter().sum::<f64>() / period as f64;
    let mut values = Vec::with_capacity(bars.len() - period + 1);
    values.push(IndicatorPoint {
        date: bars[period - 1].date,
        value: atr,
    });

    for i in period..bars.len() {
        atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
        values.push(IndicatorPoint {
            date: bars[i].date,
            value: atr,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

/// Long-side stop line `close - multiplier * ATR(period)`.
pub fn calculate_atr_stop(bars: &[DailyBar], period: usize, multiplier: f64) -> IndicatorSeries {
    let indicator_type = IndicatorType::AtrStop {
        period,
        multiplier_x100: (multiplier * 100.0).round().max(0.0) as u32,
    };

    let atr = calculate_atr(bars, period);
    if atr.is_empty() {
        return IndicatorSeries::empty(indicator_type);
    }

    // ATR points line up with bars[period - 1..].
    let values = atr
        .values
        .iter()
        .zip(&bars[period - 1..])
        .map(|(point, bar)| IndicatorPoint {
            date: point.date,
            value: bar.close - multiplier * point.value,
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
