//! The check-freshness-and-refresh cycle.
//!
//! For every symbol the store is asked for its latest date, the freshness
//! checker decides what (if anything) to fetch, and new bars are appended.
//! A failing data source degrades that symbol to its cached data; a failing
//! store aborts the cycle.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::StonkError;
use crate::domain::freshness::{compute_fetch_range, FetchRange};
use crate::domain::gaps::sanitize_bars;
use crate::domain::instrument::Instrument;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::store_port::PriceStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshStatus {
    UpToDate,
    Fetched {
        range: FetchRange,
        received: usize,
        inserted: usize,
    },
    /// The source failed; stored data is left as it was.
    Degraded { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub symbol: String,
    #[serde(flatten)]
    pub status: RefreshStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub outcomes: Vec<RefreshOutcome>,
}

impl RefreshReport {
    pub fn inserted(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                RefreshStatus::Fetched { inserted, .. } => inserted,
                _ => 0,
            })
            .sum()
    }

    pub fn degraded(&self) -> Vec<&RefreshOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, RefreshStatus::Degraded { .. }))
            .collect()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded().is_empty()
    }
}

pub fn refresh_symbols(
    store: &dyn PriceStore,
    source: &dyn MarketDataPort,
    symbols: &[String],
    today: NaiveDate,
    lookback_years: u32,
) -> Result<RefreshReport, StonkError> {
    let mut report = RefreshReport::default();
    for symbol in symbols {
        let status = refresh_one(store, source, symbol, today, lookback_years)?;
        report.outcomes.push(RefreshOutcome {
            symbol: symbol.clone(),
            status,
        });
    }

    tracing::info!(
        symbols = symbols.len(),
        inserted = report.inserted(),
        degraded = report.degraded().len(),
        "refresh cycle complete"
    );
    Ok(report)
}

fn refresh_one(
    store: &dyn PriceStore,
    source: &dyn MarketDataPort,
    symbol: &str,
    today: NaiveDate,
    lookback_years: u32,
) -> Result<RefreshStatus, StonkError> {
    sync_instrument(store, source, symbol, today)?;

    let latest = store.latest_date(symbol)?;
    let Some(range) = compute_fetch_range(latest, today, lookback_years) else {
        tracing::debug!(symbol, ?latest, "up to date");
        return Ok(RefreshStatus::UpToDate);
    };

    let fetched = match source.fetch_bars(symbol, range.start, range.end) {
        Ok(bars) => bars,
        Err(e) => {
            tracing::warn!(symbol, "data source failed, keeping cached data: {e}");
            return Ok(RefreshStatus::Degraded {
                reason: e.to_string(),
            });
        }
    };

    let received = fetched.len();
    let in_range: Vec<_> = fetched
        .into_iter()
        .filter(|b| b.symbol == symbol && range.contains(b.date))
        .collect();
    let out_of_range = received - in_range.len();
    let (bars, incomplete) = sanitize_bars(in_range);
    if out_of_range > 0 || incomplete > 0 {
        tracing::warn!(
            symbol,
            out_of_range,
            incomplete,
            "discarded bars from data source"
        );
    }

    let inserted = store.append_bars(&bars)?;
    tracing::debug!(
        symbol,
        start = %range.start,
        end = %range.end,
        received,
        inserted,
        "fetched"
    );

    Ok(RefreshStatus::Fetched {
        range,
        received,
        inserted,
    })
}

/// Create the instrument on first sight and follow metadata changes reported
/// by the source. Source metadata failures are not fatal.
fn sync_instrument(
    store: &dyn PriceStore,
    source: &dyn MarketDataPort,
    symbol: &str,
    today: NaiveDate,
) -> Result<(), StonkError> {
    let reported = match source.instrument(symbol) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!(symbol, "no instrument metadata: {e}");
            None
        }
    };

    match (store.instrument(symbol)?, reported) {
        (None, Some(meta)) => store.upsert_instrument(&Instrument::new(
            symbol,
            meta.market,
            meta.currency,
            today,
        )),
        (None, None) => store.upsert_instrument(&Instrument::unknown(symbol, today)),
        (Some(existing), Some(meta)) if existing.metadata_differs(&meta) => {
            tracing::info!(
                symbol,
                market = %meta.market,
                currency = %meta.currency,
                "instrument metadata changed"
            );
            store.upsert_instrument(&Instrument {
                first_seen: existing.first_seen,
                ..meta
            })
        }
        (Some(_), _) => Ok(()),
    }
}
