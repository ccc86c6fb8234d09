//! External market data fetcher.

use crate::domain::error::StonkError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::DailyBar;
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// Daily bars for `symbol` with dates in `[start, end]`. Implementations
    /// may return fewer bars than requested; an unreachable source is an
    /// `Err`.
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, StonkError>;

    /// Instrument metadata, if the source knows it.
    fn instrument(&self, _symbol: &str) -> Result<Option<Instrument>, StonkError> {
        Ok(None)
    }
}
