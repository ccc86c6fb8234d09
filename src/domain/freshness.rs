//! Freshness check: which date range must be fetched to bring a cached
//! series up to today.

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

pub const DEFAULT_LOOKBACK_YEARS: u32 = 5;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchRange {
    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Earliest date a cache is allowed to reach back to. Feb 29 clamps to Feb 28.
pub fn lookback_start(today: NaiveDate, lookback_years: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(lookback_years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

/// Range to fetch given the latest stored date, or `None` when the cache is
/// already current.
pub fn compute_fetch_range(
    latest_stored: Option<NaiveDate>,
    today: NaiveDate,
    lookback_years: u32,
) -> Option<FetchRange> {
    let floor = lookback_start(today, lookback_years);

    let start = match latest_stored {
        None => floor,
        Some(latest) => {
            let next = latest.checked_add_days(Days::new(1))?;
            next.max(floor)
        }
    };

    if start > today {
        return None;
    }

    Some(FetchRange { start, end: today })
}
