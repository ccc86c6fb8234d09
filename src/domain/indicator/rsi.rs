//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars produce nothing (n price changes are needed).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

pub fn calculate_rsi(bars: &[DailyBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.len() <= period {
        return IndicatorSeries::empty(IndicatorType::Rsi(period));
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = bars
        .windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(bars.len() - period);
    values.push(IndicatorPoint {
        date: bars[period].date,
        value: rsi_value(avg_gain, avg_loss),
    });

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        values.push(IndicatorPoint {
            date: bars[i + 1].date,
            value: rsi_value(avg_gain, avg_loss),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(date: &str, close: f64) -> DailyBar {
        DailyBar {
            symbol: "TEST".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 1000,
        }
    }

    fn series_of(closes: &[f64]) -> Vec<DailyBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(&format!("2024-01-{:02}", i + 1), c))
            .collect()
    }

    #[test]
    fn rsi_empty_bars() {
        let bars: Vec<DailyBar> = vec![];
        assert!(calculate_rsi(&bars, 14).is_empty());
    }

    #[test]
    fn rsi_needs_more_than_period_bars() {
        let bars = series_of(&[100.0; 14]);
        assert!(calculate_rsi(&bars, 14).is_empty());
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=20).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let bars = series_of(&closes);
        let series = calculate_rsi(&bars, 14);

        assert_eq!(series.len(), 20 - 14);
        assert_eq!(series.values[0].date, bars[14].date);
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&series_of(&closes), 14);
        assert!((series.values[0].value - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&series_of(&closes), 14);
        assert!(series.values[0].value.abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=25)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&series_of(&closes), 14);

        for point in &series.values {
            assert!(point.value >= 0.0 && point.value <= 100.0);
        }
    }

    #[test]
    fn rsi_wilder_smoothing_step() {
        // Period 2: changes +2, -1, +3
        let bars = series_of(&[10.0, 12.0, 11.0, 14.0]);
        let series = calculate_rsi(&bars, 2);
        assert_eq!(series.len(), 2);

        let (g0, l0) = (1.0, 0.5);
        let first = 100.0 - 100.0 / (1.0 + g0 / l0);
        assert!((series.values[0].value - first).abs() < 1e-9);

        let (g1, l1) = ((g0 + 3.0) / 2.0, (l0 + 0.0) / 2.0);
        let second = 100.0 - 100.0 / (1.0 + g1 / l1);
        assert!((series.values[1].value - second).abs() < 1e-9);
    }

    #[test]
    fn rsi_indicator_type() {
        let series = calculate_rsi(&series_of(&[1.0]), 14);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(14));
    }

    #[test]
    fn rsi_known_calculation() {
        let bars = series_of(&[
            44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
            46.25, 46.0, 46.50,
        ]);
        let series = calculate_rsi(&bars, 14);

        assert_eq!(series.len(), 1);
        let rsi = series.values[0].value;
        assert!(rsi > 50.0 && rsi < 100.0, "RSI should be in bullish territory");
    }
}
