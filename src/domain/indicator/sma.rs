//! Simple moving averages of close and of volume.
//!
//! SMA(n)[i] = mean(x[i-n+1..=i]). Warmup: first (n-1) bars produce nothing.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

pub fn calculate_sma(bars: &[DailyBar], period: usize) -> IndicatorSeries {
    rolling_mean(bars, period, IndicatorType::Sma(period), |b| b.close)
}

pub fn calculate_volume_sma(bars: &[DailyBar], period: usize) -> IndicatorSeries {
    rolling_mean(bars, period, IndicatorType::VolumeSma(period), |b| {
        b.volume as f64
    })
}

fn rolling_mean(
    bars: &[DailyBar],
    period: usize,
    indicator_type: IndicatorType,
    field: impl Fn(&DailyBar) -> f64,
) -> IndicatorSeries {
    if period == 0 || bars.len() < period {
        return IndicatorSeries::empty(indicator_type);
    }

    let mut values = Vec::with_capacity(bars.len() - period + 1);
    let mut sum: f64 = bars[..period].iter().map(&field).sum();
    values.push(IndicatorPoint {
        date: bars[period - 1].date,
        value: sum / period as f64,
    });

    for i in period..bars.len() {
        sum += field(&bars[i]) - field(&bars[i - period]);
        values.push(IndicatorPoint {
            date: bars[i].date,
            value: sum / period as f64,
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
