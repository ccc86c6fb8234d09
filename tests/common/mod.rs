#![allow(dead_code)]

use chrono::NaiveDate;
pub use stonkulator::domain::ohlcv::DailyBar;
use stonkulator::adapters::sqlite_adapter::SqliteAdapter;
use stonkulator::domain::error::StonkError;
use stonkulator::ports::market_data_port::MarketDataPort;
use stonkulator::ports::store_port::PriceStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// In-memory market data source. Returns only the bars inside the requested
/// range and records every request.
pub struct MockSource {
    pub data: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
    pub requests: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl MarketDataPort for MockSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, StonkError> {
        self.requests
            .lock()
            .unwrap()
            .push((symbol.to_string(), start, end));
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StonkError::Source {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: &str, close: f64) -> DailyBar {
    DailyBar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        adj_close: close,
        volume: 1000,
    }
}

/// `count` consecutive calendar days of gently oscillating prices.
pub fn generate_bars(symbol: &str, start_date: &str, count: usize, start_price: f64) -> Vec<DailyBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    let phase = symbol.len() as f64;
    (0..count)
        .map(|i| {
            let close = start_price + (i as f64 * 0.4 + phase).sin() * 3.0 + i as f64 * 0.1;
            DailyBar {
                symbol: symbol.to_string(),
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                adj_close: close,
                volume: 1000 + i as i64,
            }
        })
        .collect()
}

pub fn memory_store() -> SqliteAdapter {
    let store = SqliteAdapter::in_memory().unwrap();
    store.initialize_schema().unwrap();
    store
}

pub fn seeded_store(series: &[Vec<DailyBar>]) -> SqliteAdapter {
    let store = memory_store();
    for bars in series {
        store.append_bars(bars).unwrap();
    }
    store
}

/// Write bars as a `<SYMBOL>.csv` download file.
pub fn write_csv(dir: &Path, symbol: &str, bars: &[DailyBar]) {
    let mut out = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.adj_close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), out).unwrap();
}
