//! CSV directory market data source.
//!
//! One `<SYMBOL>.csv` per instrument in the download layout most quote sites
//! export: `Date,Open,High,Low,Close,Adj Close,Volume`. `Adj Close` may be
//! absent (it then equals `Close`), and so may `Volume` (then 0). A row with an
//! empty or `null` cell in any column the file has is incomplete and skipped.
//! An optional `instruments.csv` (`symbol,market,currency`) supplies metadata.

use crate::domain::error::StonkError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::DailyBar;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const INSTRUMENTS_FILE: &str = "instruments.csv";

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<String>,
    #[serde(rename = "High")]
    high: Option<String>,
    #[serde(rename = "Low")]
    low: Option<String>,
    #[serde(rename = "Close")]
    close: Option<String>,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<String>,
    #[serde(rename = "Volume", default)]
    volume: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    symbol: String,
    market: String,
    currency: String,
}

fn cell(value: &Option<String>) -> Option<f64> {
    let raw = value.as_deref()?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return None;
    }
    raw.parse::<f64>().ok()
}

/// Which optional columns the file header declares.
#[derive(Debug, Clone, Copy)]
struct Columns {
    adj_close: bool,
    volume: bool,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        Self {
            adj_close: headers.iter().any(|h| h == "Adj Close"),
            volume: headers.iter().any(|h| h == "Volume"),
        }
    }
}

impl PriceRow {
    fn into_bar(self, symbol: &str, columns: Columns) -> Option<DailyBar> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()?;
        let close = cell(&self.close)?;
        Some(DailyBar {
            symbol: symbol.to_string(),
            date,
            open: cell(&self.open)?,
            high: cell(&self.high)?,
            low: cell(&self.low)?,
            close,
            adj_close: if columns.adj_close {
                cell(&self.adj_close)?
            } else {
                close
            },
            volume: if columns.volume {
                cell(&self.volume)?.round() as i64
            } else {
                0
            },
        })
    }
}

pub struct CsvSource {
    base_path: PathBuf,
}

impl CsvSource {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    /// Symbols with a price file in the directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, StonkError> {
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(".csv") {
                if name != INSTRUMENTS_FILE {
                    symbols.push(symbol.to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

impl MarketDataPort for CsvSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, StonkError> {
        let path = self.csv_path(symbol);
        let source_error = |reason: String| StonkError::Source {
            symbol: symbol.to_string(),
            reason,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| source_error(format!("cannot read {}: {e}", path.display())))?;

        let columns = Columns::from_headers(
            rdr.headers()
                .map_err(|e| source_error(format!("{}: {e}", path.display())))?,
        );

        let mut bars = Vec::new();
        let mut skipped = 0usize;
        for row in rdr.deserialize::<PriceRow>() {
            let row = row.map_err(|e| source_error(format!("{}: {e}", path.display())))?;
            match row.into_bar(symbol, columns) {
                Some(bar) if bar.date >= start && bar.date <= end => bars.push(bar),
                Some(_) => {}
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::debug!(symbol, skipped, "skipped incomplete csv rows");
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn instrument(&self, symbol: &str) -> Result<Option<Instrument>, StonkError> {
        let path = self.base_path.join(INSTRUMENTS_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)?;
        for row in rdr.deserialize::<InstrumentRow>() {
            let row = row?;
            if row.symbol.eq_ignore_ascii_case(symbol) {
                // The store keeps its own first-seen date.
                let today = chrono::Local::now().date_naive();
                return Ok(Some(Instrument::new(
                    symbol,
                    row.market,
                    row.currency,
                    today,
                )));
            }
        }
        Ok(None)
    }
}
