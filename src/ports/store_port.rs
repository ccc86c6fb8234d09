//! Instrument and daily price persistence.

use crate::domain::error::StonkError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::DailyBar;
use chrono::NaiveDate;

pub trait PriceStore {
    fn initialize_schema(&self) -> Result<(), StonkError>;

    /// Insert the instrument, or update its market and currency. The
    /// `first_seen` date of an existing row is never changed.
    fn upsert_instrument(&self, instrument: &Instrument) -> Result<(), StonkError>;

    fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, StonkError>;

    fn list_instruments(&self) -> Result<Vec<Instrument>, StonkError>;

    fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StonkError>;

    /// Append bars, ignoring any `(symbol, date)` already stored. Returns the
    /// number of rows actually inserted.
    fn append_bars(&self, bars: &[DailyBar]) -> Result<usize, StonkError>;

    /// Bars for `symbol` in `[start, end]`, ascending by date.
    fn bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, StonkError>;

    fn all_bars(&self, symbol: &str) -> Result<Vec<DailyBar>, StonkError>;

    /// First date, last date and bar count for `symbol`.
    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StonkError>;
}
