//! Monte-Carlo sampling of the risk/return cloud of long-only portfolios.
//!
//! Random weight vectors are drawn over the instruments of a
//! [`ReturnMatrix`]; each is scored on annualized return, annualized
//! volatility and Sharpe ratio. The upper-left boundary of the cloud
//! approximates the efficient frontier.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::domain::error::StonkError;
use crate::domain::gaps::{align_closes, GapPolicy};
use crate::domain::metrics::{mean, sample_covariance, TRADING_DAYS_PER_YEAR};
use crate::domain::ohlcv::DailyBar;

pub const DEFAULT_SAMPLES: usize = 10_000;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone)]
pub struct FrontierConfig {
    pub samples: usize,
    pub seed: u64,
    pub risk_free_rate: f64,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            seed: DEFAULT_SEED,
            risk_free_rate: 0.0,
        }
    }
}

/// Daily simple returns, one equally long column per symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    pub symbols: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    pub fn new(symbols: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self, StonkError> {
        if symbols.len() != columns.len() {
            return Err(StonkError::invalid_input(format!(
                "{} symbols but {} return columns",
                symbols.len(),
                columns.len()
            )));
        }
        if let Some(first) = columns.first() {
            if columns.iter().any(|c| c.len() != first.len()) {
                return Err(StonkError::invalid_input("return columns differ in length"));
            }
        }
        Ok(Self { symbols, columns })
    }

    /// Align the adjusted close series on a shared date axis and take daily
    /// returns.
    pub fn from_bars(
        series: &[(String, Vec<DailyBar>)],
        policy: GapPolicy,
    ) -> Result<Self, StonkError> {
        let slices: Vec<&[DailyBar]> = series.iter().map(|(_, bars)| bars.as_slice()).collect();
        let aligned = align_closes(&slices, policy);
        let symbols = series.iter().map(|(s, _)| s.clone()).collect();
        Self::new(symbols, aligned.returns())
    }

    pub fn assets(&self) -> usize {
        self.columns.len()
    }

    pub fn observations(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Mean daily return per asset, times 252.
    pub fn annualized_means(&self) -> Vec<f64> {
        self.columns
            .iter()
            .map(|c| mean(c) * TRADING_DAYS_PER_YEAR)
            .collect()
    }

    /// Sample covariance of daily returns, times 252.
    pub fn annualized_covariance(&self) -> Vec<Vec<f64>> {
        self.columns
            .iter()
            .map(|a| {
                self.columns
                    .iter()
                    .map(|b| sample_covariance(a, b) * TRADING_DAYS_PER_YEAR)
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierPoint {
    pub weights: Vec<f64>,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrontierResult {
    pub symbols: Vec<String>,
    pub points: Vec<FrontierPoint>,
    /// The user's own allocation scored the same way, when supplied.
    pub actual: Option<FrontierPoint>,
    pub min_volatility: usize,
    pub max_sharpe: usize,
}

impl FrontierResult {
    pub fn min_volatility_point(&self) -> &FrontierPoint {
        &self.points[self.min_volatility]
    }

    pub fn max_sharpe_point(&self) -> &FrontierPoint {
        &self.points[self.max_sharpe]
    }

    /// Points ordered by volatility whose return beats every point with
    /// lower volatility.
    pub fn efficient_edge(&self) -> Vec<&FrontierPoint> {
        let mut order: Vec<&FrontierPoint> = self.points.iter().collect();
        order.sort_by(|a, b| a.annual_volatility.total_cmp(&b.annual_volatility));

        let mut best = f64::NEG_INFINITY;
        order
            .into_iter()
            .filter(|p| {
                if p.annual_return > best {
                    best = p.annual_return;
                    true
                } else {
                    false
                }
            })
            .collect()
    }
}

struct Scorer {
    means: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    risk_free_rate: f64,
}

impl Scorer {
    fn score(&self, weights: Vec<f64>) -> FrontierPoint {
        let annual_return: f64 = weights.iter().zip(&self.means).map(|(w, m)| w * m).sum();

        let mut variance = 0.0;
        for (i, wi) in weights.iter().enumerate() {
            for (j, wj) in weights.iter().enumerate() {
                variance += wi * wj * self.covariance[i][j];
            }
        }
        let annual_volatility = variance.max(0.0).sqrt();

        let sharpe_ratio = if annual_volatility > 0.0 {
            (annual_return - self.risk_free_rate) / annual_volatility
        } else {
            0.0
        };

        FrontierPoint {
            weights,
            annual_return,
            annual_volatility,
            sharpe_ratio,
        }
    }
}

fn random_weights(rng: &mut StdRng, assets: usize) -> Vec<f64> {
    loop {
        let raw: Vec<f64> = (0..assets).map(|_| rng.r#gen::<f64>()).collect();
        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            return raw.into_iter().map(|w| w / total).collect();
        }
    }
}

pub fn sample_frontier(
    matrix: &ReturnMatrix,
    actual_weights: Option<&[f64]>,
    config: &FrontierConfig,
) -> Result<FrontierResult, StonkError> {
    let assets = matrix.assets();
    if assets == 0 {
        return Err(StonkError::invalid_input("frontier needs at least one instrument"));
    }
    if matrix.observations() < 2 {
        return Err(StonkError::invalid_input(format!(
            "frontier needs at least 2 aligned daily returns, got {}",
            matrix.observations()
        )));
    }
    if config.samples == 0 {
        return Err(StonkError::invalid_input("sample count must be positive"));
    }

    let actual_weights = match actual_weights {
        Some(w) => {
            if w.len() != assets {
                return Err(StonkError::invalid_input(format!(
                    "expected {} portfolio weights, got {}",
                    assets,
                    w.len()
                )));
            }
            let total: f64 = w.iter().sum();
            if !(total.is_finite() && total > 0.0) {
                return Err(StonkError::invalid_input("portfolio weights must sum to a positive value"));
            }
            Some(w.iter().map(|x| x / total).collect::<Vec<f64>>())
        }
        None => None,
    };

    let scorer = Scorer {
        means: matrix.annualized_means(),
        covariance: matrix.annualized_covariance(),
        risk_free_rate: config.risk_free_rate,
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let points: Vec<FrontierPoint> = (0..config.samples)
        .map(|_| scorer.score(random_weights(&mut rng, assets)))
        .collect();

    let mut min_volatility = 0;
    let mut max_sharpe = 0;
    for (i, p) in points.iter().enumerate() {
        if p.annual_volatility < points[min_volatility].annual_volatility {
            min_volatility = i;
        }
        if p.sharpe_ratio > points[max_sharpe].sharpe_ratio {
            max_sharpe = i;
        }
    }

    tracing::debug!(
        assets,
        samples = config.samples,
        observations = matrix.observations(),
        "sampled frontier"
    );

    Ok(FrontierResult {
        symbols: matrix.symbols.clone(),
        points,
        actual: actual_weights.map(|w| scorer.score(w)),
        min_volatility,
        max_sharpe,
    })
}
