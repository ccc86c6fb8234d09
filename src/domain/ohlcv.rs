//! Daily OHLCV bar representation.

use chrono::NaiveDate;
use serde::Serialize;

/// One trading day for one symbol. `(symbol, date)` is the identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
}

impl DailyBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Price for return and risk series. Adjusted for splits and dividends,
    /// so a corporate action does not show up as a price jump.
    pub fn return_price(&self) -> f64 {
        self.adj_close
    }

    /// This bar's adjusted close in the share units of `latest`. For the
    /// latest bar itself this is its raw close.
    pub fn close_in_units_of(&self, latest: &DailyBar) -> f64 {
        if latest.adj_close > 0.0 {
            self.adj_close * latest.close / latest.adj_close
        } else {
            self.close
        }
    }

    /// A bar is usable when its prices are finite and both closes are positive.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.adj_close]
            .iter()
            .all(|v| v.is_finite())
            && self.close > 0.0
            && self.adj_close > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> DailyBar {
        DailyBar {
            symbol: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            adj_close: 105.0,
            volume: 50_000,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        // high-low=20, |high-100|=10, |low-100|=10 → 20
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        // high-low=20, |110-130|=20, |90-130|=40 → 40
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn previous_close_rescaled_across_split() {
        let mut before = sample_bar();
        before.close = 200.0;
        before.adj_close = 100.0;
        let mut after = sample_bar();
        after.close = 102.0;
        after.adj_close = 102.0;
        assert!((before.close_in_units_of(&after) - 100.0).abs() < 1e-12);
        assert!((after.close_in_units_of(&after) - 102.0).abs() < 1e-12);
        assert_eq!(before.return_price(), 100.0);
    }

    #[test]
    fn complete_bar() {
        assert!(sample_bar().is_complete());
    }

    #[test]
    fn nan_or_non_positive_close_is_incomplete() {
        let mut bar = sample_bar();
        bar.high = f64::NAN;
        assert!(!bar.is_complete());

        let mut bar = sample_bar();
        bar.close = 0.0;
        assert!(!bar.is_complete());
    }
}
