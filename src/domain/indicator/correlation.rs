//! Trailing correlation of daily returns against a benchmark.
//!
//! Both series are put on a shared date axis first (see [`GapPolicy`]); the
//! Pearson coefficient is taken over the last n daily returns. A window with
//! zero variance in either series yields 0.
//! Warmup: first n aligned bars produce nothing (n returns need n+1 closes).

use crate::domain::gaps::{align_closes, simple_returns, GapPolicy};
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

pub fn calculate_correlation(
    bars: &[DailyBar],
    benchmark: &[DailyBar],
    period: usize,
    policy: GapPolicy,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Correlation(period);
    if period < indicator_type.min_window() {
        return IndicatorSeries::empty(indicator_type);
    }

    let aligned = align_closes(&[bars, benchmark], policy);
    if aligned.len() <= period {
        return IndicatorSeries::empty(indicator_type);
    }

    let xs = simple_returns(&aligned.closes[0]);
    let ys = simple_returns(&aligned.closes[1]);

    let values = (period - 1..xs.len())
        .map(|end| {
            let start = end + 1 - period;
            IndicatorPoint {
                date: aligned.dates[end + 1],
                value: pearson(&xs[start..=end], &ys[start..=end]),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Pearson correlation coefficient of two equally long samples.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(symbol: &str, closes: &[f64]) -> Vec<DailyBar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
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

    fn zigzag(n: usize, base: f64, amp: f64) -> Vec<f64> {
        (0..n)
            .map(|i| base + if i % 2 == 0 { 0.0 } else { amp } + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn identical_series_correlate_perfectly() {
        let closes = zigzag(30, 100.0, 3.0);
        let a = make_bars("A", &closes);
        let b = make_bars("B", &closes);
        let series = calculate_correlation(&a, &b, 20, GapPolicy::Drop);

        assert_eq!(series.len(), 30 - 20);
        assert_eq!(series.values[0].date, a[20].date);
        for p in &series.values {
            assert!((p.value - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn mirrored_returns_correlate_negatively() {
        let up = zigzag(25, 100.0, 3.0);
        let down: Vec<f64> = up.iter().map(|c| 300.0 - c).collect();
        let series =
            calculate_correlation(&make_bars("A", &up), &make_bars("B", &down), 5, GapPolicy::Drop);
        for p in &series.values {
            assert!(p.value < -0.9, "expected strong negative correlation, got {}", p.value);
        }
    }

    #[test]
    fn length_follows_aligned_dates() {
        let a = make_bars("A", &zigzag(30, 100.0, 2.0));
        // Benchmark misses the first 5 days.
        let b: Vec<DailyBar> = make_bars("B", &zigzag(30, 50.0, 1.0))
            .into_iter()
            .skip(5)
            .collect();
        let series = calculate_correlation(&a, &b, 10, GapPolicy::Drop);
        assert_eq!(series.len(), 25 - 10);
    }

    #[test]
    fn short_input_is_empty() {
        let a = make_bars("A", &[1.0, 2.0, 3.0]);
        assert!(calculate_correlation(&a, &a, 3, GapPolicy::Drop).is_empty());
        assert!(calculate_correlation(&a, &a, 1, GapPolicy::Drop).is_empty());
    }

    #[test]
    fn smallest_window_follows_warmup() {
        let closes = zigzag(12, 100.0, 3.0);
        let a = make_bars("A", &closes);
        let indicator_type = IndicatorType::Correlation(2);
        assert_eq!(indicator_type.min_window(), 2);
        let series = calculate_correlation(&a, &a, 2, GapPolicy::Drop);
        assert_eq!(series.len(), a.len() - indicator_type.warmup());
        assert!(IndicatorType::Correlation(1).min_window() > 1);
    }

    #[test]
    fn flat_series_has_zero_correlation() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
    }
}
