//! Missing-data handling.
//!
//! Single series are never padded: indicators run over the bars that exist.
//! When several series must share a date axis (correlation, portfolio value,
//! frontier returns) a [`GapPolicy`] decides what happens to dates that some
//! series lack. Aligned series carry adjusted closes, since every consumer
//! turns them into returns.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::domain::ohlcv::DailyBar;

pub const DEFAULT_MAX_FILL: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GapPolicy {
    /// Keep only dates every series has.
    #[default]
    Drop,
    /// Carry the previous close forward for up to `max_fill` consecutive dates.
    ForwardFill { max_fill: usize },
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapPolicy::Drop => write!(f, "drop"),
            GapPolicy::ForwardFill { max_fill } => write!(f, "ffill({})", max_fill),
        }
    }
}

impl FromStr for GapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(GapPolicy::Drop),
            "ffill" | "forward_fill" | "forward-fill" => Ok(GapPolicy::ForwardFill {
                max_fill: DEFAULT_MAX_FILL,
            }),
            other => Err(format!("unknown gap policy '{other}' (expected drop or ffill)")),
        }
    }
}

/// Sort by date, keep the last bar seen for a duplicated date, and drop
/// incomplete bars. Returns the cleaned series and how many rows were dropped.
pub fn sanitize_bars(bars: Vec<DailyBar>) -> (Vec<DailyBar>, usize) {
    let total = bars.len();
    let mut by_date: BTreeMap<NaiveDate, DailyBar> = BTreeMap::new();
    for bar in bars.into_iter().filter(DailyBar::is_complete) {
        by_date.insert(bar.date, bar);
    }
    let cleaned: Vec<DailyBar> = by_date.into_values().collect();
    let dropped = total - cleaned.len();
    (cleaned, dropped)
}

/// Adjusted closes of several series on one shared date axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCloses {
    pub dates: Vec<NaiveDate>,
    /// One column per input series, each `dates.len()` long.
    pub closes: Vec<Vec<f64>>,
}

impl AlignedCloses {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Simple daily returns per column; one element shorter than the closes.
    pub fn returns(&self) -> Vec<Vec<f64>> {
        self.closes.iter().map(|c| simple_returns(c)).collect()
    }
}

/// `p[i] / p[i-1] - 1` for consecutive prices.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Put the adjusted closes of `series` on a shared date axis. Each input must be
/// sorted by date (see [`sanitize_bars`]).
pub fn align_closes(series: &[&[DailyBar]], policy: GapPolicy) -> AlignedCloses {
    if series.is_empty() || series.iter().any(|s| s.is_empty()) {
        return AlignedCloses {
            dates: Vec::new(),
            closes: vec![Vec::new(); series.len()],
        };
    }

    let maps: Vec<BTreeMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| s.iter().map(|b| (b.date, b.return_price())).collect())
        .collect();

    match policy {
        GapPolicy::Drop => align_inner(&maps),
        GapPolicy::ForwardFill { max_fill } => align_forward_fill(&maps, max_fill),
    }
}

fn align_inner(maps: &[BTreeMap<NaiveDate, f64>]) -> AlignedCloses {
    let dates: Vec<NaiveDate> = maps[0]
        .keys()
        .filter(|d| maps[1..].iter().all(|m| m.contains_key(d)))
        .copied()
        .collect();

    let closes = maps
        .iter()
        .map(|m| dates.iter().map(|d| m[d]).collect())
        .collect();

    AlignedCloses { dates, closes }
}

fn align_forward_fill(maps: &[BTreeMap<NaiveDate, f64>], max_fill: usize) -> AlignedCloses {
    // Every series must have started before a date can be used.
    let first_common = maps
        .iter()
        .filter_map(|m| m.keys().next().copied())
        .max();
    let Some(first_common) = first_common else {
        return AlignedCloses {
            dates: Vec::new(),
            closes: vec![Vec::new(); maps.len()],
        };
    };

    let union: BTreeSet<NaiveDate> = maps
        .iter()
        .flat_map(|m| m.range(first_common..).map(|(d, _)| *d))
        .collect();

    let mut dates = Vec::with_capacity(union.len());
    let mut closes: Vec<Vec<f64>> = vec![Vec::with_capacity(union.len()); maps.len()];
    let mut last: Vec<Option<f64>> = maps
        .iter()
        .map(|m| m.range(..first_common).next_back().map(|(_, c)| *c))
        .collect();
    let mut run: Vec<usize> = vec![0; maps.len()];

    for date in union {
        let mut row = Vec::with_capacity(maps.len());
        let mut usable = true;

        for (i, m) in maps.iter().enumerate() {
            match m.get(&date) {
                Some(&close) => {
                    last[i] = Some(close);
                    run[i] = 0;
                    row.push(close);
                }
                None => {
                    run[i] += 1;
                    match last[i] {
                        Some(prev) if run[i] <= max_fill => row.push(prev),
                        _ => usable = false,
                    }
                }
            }
        }

        if usable {
            dates.push(date);
            for (col, value) in closes.iter_mut().zip(row) {
                col.push(value);
            }
        }
    }

    AlignedCloses { dates, closes }
}
