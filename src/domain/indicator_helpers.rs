//! Computes the configured indicator set for one instrument.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::gaps::GapPolicy;
use crate::domain::indicator::atr::{calculate_atr, calculate_atr_stop, DEFAULT_ATR_MULTIPLIER};
use crate::domain::indicator::correlation::calculate_correlation;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::{calculate_sma, calculate_volume_sma};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorConfig {
    pub ema_windows: Vec<usize>,
    pub sma_windows: Vec<usize>,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub volume_sma_window: usize,
    pub correlation_window: usize,
    pub gap_policy: GapPolicy,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_windows: vec![3, 50, 200],
            sma_windows: Vec::new(),
            rsi_period: 14,
            atr_period: 14,
            atr_multiplier: DEFAULT_ATR_MULTIPLIER,
            volume_sma_window: 20,
            correlation_window: 20,
            gap_policy: GapPolicy::Drop,
        }
    }
}

impl IndicatorConfig {
    /// Indicator types this config produces; correlation only with a benchmark.
    pub fn indicator_types(&self, with_benchmark: bool) -> Vec<IndicatorType> {
        let mut types: Vec<IndicatorType> = self
            .ema_windows
            .iter()
            .map(|&n| IndicatorType::Ema(n))
            .chain(self.sma_windows.iter().map(|&n| IndicatorType::Sma(n)))
            .collect();
        types.push(IndicatorType::VolumeSma(self.volume_sma_window));
        types.push(IndicatorType::Rsi(self.rsi_period));
        types.push(IndicatorType::Atr(self.atr_period));
        types.push(IndicatorType::AtrStop {
            period: self.atr_period,
            multiplier_x100: (self.atr_multiplier * 100.0).round().max(0.0) as u32,
        });
        if with_benchmark {
            types.push(IndicatorType::Correlation(self.correlation_window));
        }
        types
    }
}

/// Every series in `config`, keyed by type. `bars` must be sorted by date.
pub fn compute_indicators(
    bars: &[DailyBar],
    benchmark: Option<&[DailyBar]>,
    config: &IndicatorConfig,
) -> BTreeMap<IndicatorType, IndicatorSeries> {
    let mut result = BTreeMap::new();

    for indicator_type in config.indicator_types(benchmark.is_some()) {
        let series = match &indicator_type {
            IndicatorType::Sma(n) => calculate_sma(bars, *n),
            IndicatorType::Ema(n) => calculate_ema(bars, *n),
            IndicatorType::VolumeSma(n) => calculate_volume_sma(bars, *n),
            IndicatorType::Rsi(n) => calculate_rsi(bars, *n),
            IndicatorType::Atr(n) => calculate_atr(bars, *n),
            IndicatorType::AtrStop { period, .. } => {
                calculate_atr_stop(bars, *period, config.atr_multiplier)
            }
            IndicatorType::Correlation(n) => match benchmark {
                Some(bench) => calculate_correlation(bars, bench, *n, config.gap_policy),
                None => continue,
            },
        };
        result.insert(indicator_type, series);
    }

    result
}
