//! SQLite price store.
//!
//! Two tables: `instrument` (one row per symbol) and `daily_prices` keyed by
//! `(symbol, date)`. Dates are stored as `YYYY-MM-DD` text so lexical order is
//! chronological order.

use crate::domain::error::StonkError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::DailyBar;
use crate::domain::settings::Settings;
use crate::ports::store_port::PriceStore;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

const BAR_COLUMNS: &str = "symbol, date, open, high, low, close, adj_close, volume";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, StonkError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
        Ok(Self { pool })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, StonkError> {
        let adapter = Self::open(&settings.db_path, settings.pool_size)?;
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    /// Single-connection in-memory database, for tests and dry runs.
    pub fn in_memory() -> Result<Self, StonkError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StonkError> {
        Ok(self.pool.get()?)
    }
}

fn parse_date(text: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            text.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn bar_from_row(row: &Row<'_>) -> rusqlite::Result<DailyBar> {
    let date: String = row.get(1)?;
    Ok(DailyBar {
        symbol: row.get(0)?,
        date: parse_date(&date)?,
        open: row.get(2)?,
        high: row.get(3)?,
        low: row.get(4)?,
        close: row.get(5)?,
        adj_close: row.get(6)?,
        volume: row.get(7)?,
    })
}

fn instrument_from_row(row: &Row<'_>) -> rusqlite::Result<Instrument> {
    let first_seen: String = row.get(3)?;
    Ok(Instrument {
        symbol: row.get(0)?,
        market: row.get(1)?,
        currency: row.get(2)?,
        first_seen: parse_date(&first_seen)?,
    })
}

impl PriceStore for SqliteAdapter {
    fn initialize_schema(&self) -> Result<(), StonkError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS instrument (
                symbol TEXT PRIMARY KEY,
                market TEXT NOT NULL,
                currency TEXT NOT NULL,
                first_seen TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS daily_prices (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                adj_close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_daily_prices_date ON daily_prices(date);",
        )?;
        Ok(())
    }

    fn upsert_instrument(&self, instrument: &Instrument) -> Result<(), StonkError> {
        self.conn()?.execute(
            "INSERT INTO instrument (symbol, market, currency, first_seen)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(symbol) DO UPDATE SET
                market = excluded.market,
                currency = excluded.currency",
            params![
                instrument.symbol,
                instrument.market,
                instrument.currency,
                instrument.first_seen.format(DATE_FORMAT).to_string()
            ],
        )?;
        Ok(())
    }

    fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, StonkError> {
        let found = self
            .conn()?
            .query_row(
                "SELECT symbol, market, currency, first_seen FROM instrument WHERE symbol = ?1",
                params![symbol],
                instrument_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn list_instruments(&self) -> Result<Vec<Instrument>, StonkError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT symbol, market, currency, first_seen FROM instrument ORDER BY symbol",
        )?;
        let rows = stmt.query_map([], instrument_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn latest_date(&self, symbol: &str) -> Result<Option<NaiveDate>, StonkError> {
        let latest: Option<String> = self.conn()?.query_row(
            "SELECT MAX(date) FROM daily_prices WHERE symbol = ?1",
            params![symbol],
            |row| row.get(0),
        )?;
        Ok(latest.as_deref().map(parse_date).transpose()?)
    }

    fn append_bars(&self, bars: &[DailyBar]) -> Result<usize, StonkError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO daily_prices
                    (symbol, date, open, high, low, close, adj_close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for bar in bars {
                inserted += stmt.execute(params![
                    bar.symbol,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.adj_close,
                    bar.volume
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, StonkError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BAR_COLUMNS} FROM daily_prices
             WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC"
        ))?;
        let rows = stmt.query_map(
            params![
                symbol,
                start.format(DATE_FORMAT).to_string(),
                end.format(DATE_FORMAT).to_string()
            ],
            bar_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn all_bars(&self, symbol: &str) -> Result<Vec<DailyBar>, StonkError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BAR_COLUMNS} FROM daily_prices WHERE symbol = ?1 ORDER BY date ASC"
        ))?;
        let rows = stmt.query_map(params![symbol], bar_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StonkError> {
        let result: (Option<String>, Option<String>, i64) = self.conn()?.query_row(
            "SELECT MIN(date), MAX(date), COUNT(*) FROM daily_prices WHERE symbol = ?1",
            params![symbol],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        match result {
            (Some(min), Some(max), count) if count > 0 => Ok(Some((
                parse_date(&min)?,
                parse_date(&max)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
