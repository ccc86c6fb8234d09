//! HTTP request handlers for the JSON API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::frontier::{FrontierPoint, FrontierResult};
use crate::domain::indicator::IndicatorSeries;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::DailyBar;
use crate::domain::portfolio::PortfolioStats;
use crate::domain::queries;
use crate::domain::refresh::RefreshReport;
use crate::domain::summary::SeriesSummary;

use super::{run_refresh, AppState, WebError};

/// Upper bound on `?samples=` so one request cannot pin a core for minutes.
pub const MAX_FRONTIER_SAMPLES: usize = 200_000;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub instruments: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Health>, WebError> {
    let instruments = state.store.list_instruments()?.len();
    Ok(Json(Health {
        status: "ok",
        instruments,
    }))
}

#[derive(Debug, Serialize)]
pub struct InstrumentInfo {
    #[serde(flatten)]
    pub instrument: Instrument,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub bars: usize,
}

pub async fn list_instruments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InstrumentInfo>>, WebError> {
    let mut out = Vec::new();
    for instrument in state.store.list_instruments()? {
        let range = state.store.data_range(&instrument.symbol)?;
        out.push(InstrumentInfo {
            first_date: range.map(|r| r.0),
            last_date: range.map(|r| r.1),
            bars: range.map_or(0, |r| r.2),
            instrument,
        });
    }
    Ok(Json(out))
}

fn known_symbol(state: &AppState, symbol: &str) -> Result<String, WebError> {
    let symbol = symbol.trim().to_uppercase();
    match state.store.instrument(&symbol)? {
        Some(_) => Ok(symbol),
        None => Err(WebError::not_found(format!("unknown instrument {symbol}"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct BarsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

pub async fn instrument_bars(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<BarsQuery>,
) -> Result<Json<Vec<DailyBar>>, WebError> {
    let symbol = known_symbol(&state, &symbol)?;
    let bars = match (query.start, query.end) {
        (Some(start), Some(end)) if start > end => {
            return Err(WebError::bad_request("start must not be after end"));
        }
        (Some(start), Some(end)) => state.store.bars(&symbol, start, end)?,
        (start, end) => state
            .store
            .all_bars(&symbol)?
            .into_iter()
            .filter(|b| start.is_none_or(|s| b.date >= s) && end.is_none_or(|e| b.date <= e))
            .collect(),
    };
    Ok(Json(bars))
}

#[derive(Debug, Serialize)]
pub struct IndicatorsResponse {
    pub symbol: String,
    pub indicators: Vec<IndicatorSeries>,
}

pub async fn instrument_indicators(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<IndicatorsResponse>, WebError> {
    let symbol = known_symbol(&state, &symbol)?;
    let indicators = queries::symbol_indicators(state.store.as_ref(), &symbol, &state.settings)?
        .into_values()
        .collect();
    Ok(Json(IndicatorsResponse { symbol, indicators }))
}

pub async fn instrument_summary(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<SeriesSummary>, WebError> {
    let symbol = known_symbol(&state, &symbol)?;
    Ok(Json(queries::symbol_summary(state.store.as_ref(), &symbol)?))
}

pub async fn portfolio(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PortfolioStats>, WebError> {
    Ok(Json(queries::portfolio_stats(
        state.store.as_ref(),
        &state.settings,
    )?))
}

#[derive(Debug, Deserialize)]
pub struct FrontierQuery {
    pub samples: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FrontierResponse {
    #[serde(flatten)]
    pub result: FrontierResult,
    pub efficient_edge: Vec<FrontierPoint>,
}

pub async fn frontier(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FrontierQuery>,
) -> Result<Json<FrontierResponse>, WebError> {
    let mut config = state.settings.frontier_config();
    if let Some(samples) = query.samples {
        if samples > MAX_FRONTIER_SAMPLES {
            return Err(WebError::bad_request(format!(
                "samples must be at most {MAX_FRONTIER_SAMPLES}"
            )));
        }
        config.samples = samples;
    }
    if let Some(seed) = query.seed {
        config.seed = seed;
    }

    let result = tokio::task::spawn_blocking(move || {
        queries::portfolio_frontier(state.store.as_ref(), &state.settings, &config)
    })
    .await
    .map_err(|e| WebError::internal(format!("frontier task failed: {e}")))??;

    let efficient_edge = result.efficient_edge().into_iter().cloned().collect();
    Ok(Json(FrontierResponse {
        result,
        efficient_edge,
    }))
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<RefreshReport>, WebError> {
    let report = tokio::task::spawn_blocking(move || run_refresh(&state))
        .await
        .map_err(|e| WebError::internal(format!("refresh task failed: {e}")))??;
    Ok(Json(report))
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such route")
}
