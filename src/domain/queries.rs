//! Read-side queries shared by the CLI and the JSON API.

use std::collections::{BTreeMap, HashMap};

use crate::domain::error::StonkError;
use crate::domain::frontier::{sample_frontier, FrontierConfig, FrontierResult, ReturnMatrix};
use crate::domain::gaps::sanitize_bars;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::compute_indicators;
use crate::domain::ohlcv::DailyBar;
use crate::domain::portfolio::{aggregate, PortfolioStats};
use crate::domain::settings::Settings;
use crate::domain::summary::SeriesSummary;
use crate::ports::store_port::PriceStore;

/// Every stored bar for `symbol`, cleaned. Empty series are `NoData`.
pub fn load_series(store: &dyn PriceStore, symbol: &str) -> Result<Vec<DailyBar>, StonkError> {
    let (bars, dropped) = sanitize_bars(store.all_bars(symbol)?);
    if dropped > 0 {
        tracing::warn!(symbol, dropped, "ignoring incomplete stored bars");
    }
    if bars.is_empty() {
        return Err(StonkError::NoData {
            symbol: symbol.to_string(),
        });
    }
    Ok(bars)
}

pub fn symbol_summary(store: &dyn PriceStore, symbol: &str) -> Result<SeriesSummary, StonkError> {
    SeriesSummary::compute(symbol, &load_series(store, symbol)?)
}

/// The configured indicator set for `symbol`. Correlation is included when
/// the benchmark is a different instrument with stored data.
pub fn symbol_indicators(
    store: &dyn PriceStore,
    symbol: &str,
    settings: &Settings,
) -> Result<BTreeMap<IndicatorType, IndicatorSeries>, StonkError> {
    let bars = load_series(store, symbol)?;
    let benchmark = if symbol != settings.benchmark {
        match load_series(store, &settings.benchmark) {
            Ok(b) => Some(b),
            Err(StonkError::NoData { .. }) => {
                tracing::debug!(benchmark = %settings.benchmark, "no benchmark data, skipping correlation");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };
    Ok(compute_indicators(
        &bars,
        benchmark.as_deref(),
        &settings.indicators,
    ))
}

fn load_available(
    store: &dyn PriceStore,
    symbols: &[String],
) -> Result<Vec<(String, Vec<DailyBar>)>, StonkError> {
    let mut out = Vec::new();
    for symbol in symbols {
        match load_series(store, symbol) {
            Ok(bars) => out.push((symbol.clone(), bars)),
            Err(StonkError::NoData { .. }) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

pub fn portfolio_stats(store: &dyn PriceStore, settings: &Settings) -> Result<PortfolioStats, StonkError> {
    if settings.positions.is_empty() {
        return Err(StonkError::invalid_input("no portfolio positions configured"));
    }
    let symbols: Vec<String> = settings.positions.iter().map(|p| p.symbol.clone()).collect();
    let prices: HashMap<String, Vec<DailyBar>> =
        load_available(store, &symbols)?.into_iter().collect();
    aggregate(
        &settings.positions,
        &prices,
        settings.gap_policy,
        settings.risk_free_rate,
    )
}

/// Frontier over the priced holdings, with the actual allocation marked. With
/// no positions configured the watchlist is used and there is no actual point.
pub fn portfolio_frontier(
    store: &dyn PriceStore,
    settings: &Settings,
    config: &FrontierConfig,
) -> Result<FrontierResult, StonkError> {
    if settings.positions.is_empty() {
        let series = load_available(store, &settings.symbols)?;
        let matrix = ReturnMatrix::from_bars(&series, settings.gap_policy)?;
        return sample_frontier(&matrix, None, config);
    }

    let stats = portfolio_stats(store, settings)?;
    let symbols = stats.symbols();
    let series = load_available(store, &symbols)?;
    let matrix = ReturnMatrix::from_bars(&series, settings.gap_policy)?;
    sample_frontier(&matrix, Some(&stats.weights()), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::domain::position::PortfolioPosition;
    use chrono::NaiveDate;

    fn seeded_store() -> SqliteAdapter {
        let store = SqliteAdapter::in_memory().unwrap();
        store.initialize_schema().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut bars = Vec::new();
        for (symbol, base, step) in [("AAPL", 100.0, 0.7), ("MSFT", 300.0, 1.3), ("^GSPC", 4000.0, 0.4)] {
            for i in 0..60 {
                let close = base + (i as f64 * step).sin() * 5.0 + i as f64 * 0.2;
                bars.push(DailyBar {
                    symbol: symbol.into(),
                    date: start + chrono::Duration::days(i),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    adj_close: close,
                    volume: 1_000 + i,
                });
            }
        }
        store.append_bars(&bars).unwrap();
        store
    }

    fn settings() -> Settings {
        Settings {
            symbols: vec!["AAPL".into(), "MSFT".into()],
            positions: vec![
                PortfolioPosition::new("AAPL", 10.0, 90.0),
                PortfolioPosition::new("MSFT", 2.0, 280.0),
            ],
            ..Settings::default()
        }
    }

    #[test]
    fn unknown_symbol_is_no_data() {
        let store = seeded_store();
        assert!(matches!(
            symbol_summary(&store, "NOPE"),
            Err(StonkError::NoData { .. })
        ));
    }

    #[test]
    fn indicators_include_benchmark_correlation() {
        let store = seeded_store();
        let map = symbol_indicators(&store, "AAPL", &settings()).unwrap();
        assert!(map.contains_key(&IndicatorType::Correlation(20)));

        let bench = symbol_indicators(&store, "^GSPC", &settings()).unwrap();
        assert!(!bench.contains_key(&IndicatorType::Correlation(20)));
    }

    #[test]
    fn frontier_marks_actual_portfolio() {
        let store = seeded_store();
        let config = FrontierConfig {
            samples: 100,
            ..FrontierConfig::default()
        };
        let result = portfolio_frontier(&store, &settings(), &config).unwrap();
        assert_eq!(result.symbols, vec!["AAPL", "MSFT"]);
        assert!(result.actual.is_some());
    }

    #[test]
    fn frontier_without_positions_uses_watchlist() {
        let store = seeded_store();
        let s = Settings {
            positions: Vec::new(),
            ..settings()
        };
        let config = FrontierConfig {
            samples: 10,
            ..FrontierConfig::default()
        };
        let result = portfolio_frontier(&store, &s, &config).unwrap();
        assert!(result.actual.is_none());
        assert_eq!(result.points.len(), 10);
    }

    #[test]
    fn portfolio_requires_positions() {
        let store = seeded_store();
        assert!(matches!(
            portfolio_stats(&store, &Settings::default()),
            Err(StonkError::InvalidInput { .. })
        ));
    }
}
