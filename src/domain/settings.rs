//! Resolved runtime settings.
//!
//! Configuration is read, never written. Every key has a default; a missing
//! file, a missing key or an invalid value falls back to that default and the
//! fallback is logged as a warning. Configuration problems never stop the
//! dashboard from starting.

use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::error::StonkError;
use crate::domain::freshness::DEFAULT_LOOKBACK_YEARS;
use crate::domain::frontier::{FrontierConfig, DEFAULT_SAMPLES, DEFAULT_SEED};
use crate::domain::gaps::{GapPolicy, DEFAULT_MAX_FILL};
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_helpers::IndicatorConfig;
use crate::domain::position::PortfolioPosition;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_SYMBOL: &str = "^GSPC";
pub const DEFAULT_DB_PATH: &str = "stonkulator.db";
pub const DEFAULT_CSV_DIR: &str = "data";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5007";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub pool_size: u32,
    pub csv_dir: PathBuf,
    /// Watchlist: upper-cased, de-duplicated, includes every position symbol.
    pub symbols: Vec<String>,
    pub positions: Vec<PortfolioPosition>,
    pub benchmark: String,
    pub lookback_years: u32,
    pub refresh_interval_minutes: u64,
    pub indicators: IndicatorConfig,
    pub risk_free_rate: f64,
    pub frontier_samples: usize,
    pub seed: u64,
    pub gap_policy: GapPolicy,
    pub listen: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            pool_size: 4,
            csv_dir: PathBuf::from(DEFAULT_CSV_DIR),
            symbols: vec![DEFAULT_SYMBOL.to_string()],
            positions: Vec::new(),
            benchmark: DEFAULT_SYMBOL.to_string(),
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            refresh_interval_minutes: 60,
            indicators: IndicatorConfig::default(),
            risk_free_rate: 0.0,
            frontier_samples: DEFAULT_SAMPLES,
            seed: DEFAULT_SEED,
            gap_policy: GapPolicy::Drop,
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = Settings::default();

        let positions = read_positions(config);
        let mut symbols = match config.get_list("portfolio", "symbols") {
            Some(list) if !list.is_empty() => list,
            Some(_) => {
                tracing::warn!("[portfolio] symbols is empty, using {DEFAULT_SYMBOL}");
                defaults.symbols.clone()
            }
            None => defaults.symbols.clone(),
        };
        symbols.extend(positions.iter().map(|p| p.symbol.clone()));

        let gap_policy = match fallback(
            parse_key::<GapPolicy>(config, "analysis", "gap_policy", |_| Ok(())),
            defaults.gap_policy,
        ) {
            GapPolicy::ForwardFill { .. } => GapPolicy::ForwardFill {
                max_fill: fallback(
                    parse_key(config, "analysis", "max_fill", |&n: &usize| {
                        positive(n as f64)
                    }),
                    DEFAULT_MAX_FILL,
                ),
            },
            GapPolicy::Drop => GapPolicy::Drop,
        };

        let indicator_defaults = IndicatorConfig::default();
        let indicators = IndicatorConfig {
            ema_windows: read_windows(config, "ema_windows", indicator_defaults.ema_windows),
            sma_windows: read_windows(config, "sma_windows", indicator_defaults.sma_windows),
            rsi_period: fallback(
                parse_key(config, "indicators", "rsi_period", |&n: &usize| {
                    positive(n as f64)
                }),
                indicator_defaults.rsi_period,
            ),
            atr_period: fallback(
                parse_key(config, "indicators", "atr_period", |&n: &usize| {
                    positive(n as f64)
                }),
                indicator_defaults.atr_period,
            ),
            atr_multiplier: fallback(
                parse_key(config, "indicators", "atr_multiplier", |&m: &f64| positive(m)),
                indicator_defaults.atr_multiplier,
            ),
            volume_sma_window: fallback(
                parse_key(config, "indicators", "volume_sma_window", |&n: &usize| {
                    positive(n as f64)
                }),
                indicator_defaults.volume_sma_window,
            ),
            correlation_window: fallback(
                parse_key(config, "indicators", "correlation_window", |&n: &usize| {
                    let min = IndicatorType::Correlation(n).min_window();
                    if n >= min {
                        Ok(())
                    } else {
                        Err(format!("must be at least {min}"))
                    }
                }),
                indicator_defaults.correlation_window,
            ),
            gap_policy,
        };

        Settings {
            db_path: config
                .get_string("storage", "path")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            pool_size: fallback(
                parse_key(config, "storage", "pool_size", |&n: &u32| positive(n as f64)),
                defaults.pool_size,
            ),
            csv_dir: config
                .get_string("source", "csv_dir")
                .map(PathBuf::from)
                .unwrap_or(defaults.csv_dir),
            symbols: normalize_symbols(symbols),
            positions,
            benchmark: config
                .get_string("portfolio", "benchmark")
                .map(|s| s.to_uppercase())
                .unwrap_or(defaults.benchmark),
            lookback_years: fallback(
                parse_key(config, "refresh", "lookback_years", |&n: &u32| {
                    positive(n as f64)
                }),
                defaults.lookback_years,
            ),
            refresh_interval_minutes: fallback(
                parse_key(config, "refresh", "interval_minutes", |_: &u64| Ok(())),
                defaults.refresh_interval_minutes,
            ),
            indicators,
            risk_free_rate: fallback(
                parse_key(config, "analysis", "risk_free_rate", |&r: &f64| {
                    if (0.0..1.0).contains(&r) {
                        Ok(())
                    } else {
                        Err("must be between 0 and 1".into())
                    }
                }),
                defaults.risk_free_rate,
            ),
            frontier_samples: fallback(
                parse_key(config, "analysis", "frontier_samples", |&n: &usize| {
                    positive(n as f64)
                }),
                defaults.frontier_samples,
            ),
            seed: fallback(
                parse_key(config, "analysis", "seed", |_: &u64| Ok(())),
                defaults.seed,
            ),
            gap_policy,
            listen: config
                .get_string("web", "listen")
                .unwrap_or(defaults.listen),
        }
    }

    pub fn frontier_config(&self) -> FrontierConfig {
        FrontierConfig {
            samples: self.frontier_samples,
            seed: self.seed,
            risk_free_rate: self.risk_free_rate,
        }
    }

    /// Watchlist plus the benchmark, in refresh order.
    pub fn refresh_symbols(&self) -> Vec<String> {
        let mut all = self.symbols.clone();
        all.push(self.benchmark.clone());
        normalize_symbols(all)
    }
}

fn positive(value: f64) -> Result<(), String> {
    if value > 0.0 {
        Ok(())
    } else {
        Err("must be positive".into())
    }
}

fn parse_key<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    check: impl Fn(&T) -> Result<(), String>,
) -> Result<Option<T>, StonkError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    let invalid = |reason: String| StonkError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    };
    let value = raw
        .parse::<T>()
        .map_err(|_| invalid(format!("cannot parse '{raw}'")))?;
    check(&value).map_err(invalid)?;
    Ok(Some(value))
}

fn fallback<T>(parsed: Result<Option<T>, StonkError>, default: T) -> T {
    match parsed {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            tracing::warn!("{e}; using default");
            default
        }
    }
}

fn read_windows(config: &dyn ConfigPort, key: &str, default: Vec<usize>) -> Vec<usize> {
    let Some(items) = config.get_list("indicators", key) else {
        return default;
    };
    let parsed: Result<Vec<usize>, _> = items.iter().map(|s| s.parse::<usize>()).collect();
    match parsed {
        Ok(windows) if windows.iter().all(|&n| n > 0) => windows,
        _ => {
            tracing::warn!("invalid config value [indicators] {key}; using default");
            default
        }
    }
}

fn read_positions(config: &dyn ConfigPort) -> Vec<PortfolioPosition> {
    config
        .get_list("portfolio", "positions")
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| match PortfolioPosition::parse(entry) {
            Ok(position) => Some(position),
            Err(e) => {
                tracing::warn!("skipping position '{entry}': {e}");
                None
            }
        })
        .collect()
}

/// Upper-case and drop repeats, keeping first occurrence order.
pub fn normalize_symbols(symbols: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}
