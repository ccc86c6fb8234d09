//! Technical indicator implementations.
//!
//! Every calculator takes chronologically sorted bars and returns only the
//! points past its warm-up window, so the output is `input - warmup` long and
//! the first point is dated on the bar that completes the first window.

pub mod atr;
pub mod correlation;
pub mod ema;
pub mod rsi;
pub mod sma;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    VolumeSma(usize),
    Rsi(usize),
    Atr(usize),
    AtrStop {
        period: usize,
        multiplier_x100: u32,
    },
    Correlation(usize),
}

impl IndicatorType {
    /// Smallest window that produces output. Smaller windows yield an empty
    /// series; a Pearson coefficient needs at least two returns.
    pub fn min_window(&self) -> usize {
        match self {
            IndicatorType::Correlation(_) => 2,
            _ => 1,
        }
    }

    /// Number of leading bars consumed before the first output point, for a
    /// window of at least [`min_window`](Self::min_window).
    pub fn warmup(&self) -> usize {
        match self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::VolumeSma(n)
            | IndicatorType::Atr(n)
            | IndicatorType::AtrStop { period: n, .. } => n.saturating_sub(1),
            IndicatorType::Rsi(n) | IndicatorType::Correlation(n) => *n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    #[serde(serialize_with = "serialize_display")]
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorPoint> {
        self.values.last()
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &IndicatorType,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::AtrStop {
                period,
                multiplier_x100,
            } => {
                let mult = *multiplier_x100 as f64 / 100.0;
                write!(f, "ATR_STOP({},{})", period, mult)
            }
            IndicatorType::Correlation(period) => write!(f, "CORR({})", period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorType::Ema(200).to_string(), "EMA(200)");
        assert_eq!(IndicatorType::VolumeSma(20).to_string(), "VOLUME_SMA(20)");
        assert_eq!(IndicatorType::Correlation(20).to_string(), "CORR(20)");
    }

    #[test]
    fn indicator_type_display_atr_stop() {
        let stop = IndicatorType::AtrStop {
            period: 14,
            multiplier_x100: 250,
        };
        assert_eq!(stop.to_string(), "ATR_STOP(14,2.5)");
    }

    #[test]
    fn warmup_windows() {
        assert_eq!(IndicatorType::Sma(20).warmup(), 19);
        assert_eq!(IndicatorType::Ema(3).warmup(), 2);
        assert_eq!(IndicatorType::Rsi(14).warmup(), 14);
        assert_eq!(IndicatorType::Correlation(20).warmup(), 20);
        assert_eq!(IndicatorType::Sma(0).warmup(), 0);
    }

    #[test]
    fn indicator_type_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(IndicatorType::Ema(50), "ema50");
        map.insert(IndicatorType::Ema(200), "ema200");

        assert_eq!(map.get(&IndicatorType::Ema(50)), Some(&"ema50"));
        assert_eq!(map.get(&IndicatorType::Ema(200)), Some(&"ema200"));
        assert_eq!(map.get(&IndicatorType::Ema(3)), None);
    }

    #[test]
    fn series_serializes_type_as_label() {
        let series = IndicatorSeries::empty(IndicatorType::Rsi(14));
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["indicator_type"], "RSI(14)");
        assert!(json["values"].as_array().unwrap().is_empty());
    }
}
