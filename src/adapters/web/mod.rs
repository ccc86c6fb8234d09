//! JSON API consumed by the dashboard front end.
//!
//! Handlers are pull-based queries on the store. A background task runs the
//! refresh cycle on a fixed interval.

mod error;
mod handlers;

pub use error::{status_from_error, WebError};
pub use handlers::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::StonkError;
use crate::domain::refresh::{refresh_symbols, RefreshReport};
use crate::domain::settings::Settings;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::store_port::PriceStore;

pub struct AppState {
    pub store: Arc<dyn PriceStore + Send + Sync>,
    pub source: Arc<dyn MarketDataPort + Send + Sync>,
    pub settings: Arc<Settings>,
}

pub fn build_router(state: AppState) -> Router {
    build_router_shared(Arc::new(state))
}

pub fn build_router_shared(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/instruments", get(handlers::list_instruments))
        .route("/api/instruments/{symbol}/bars", get(handlers::instrument_bars))
        .route(
            "/api/instruments/{symbol}/indicators",
            get(handlers::instrument_indicators),
        )
        .route(
            "/api/instruments/{symbol}/summary",
            get(handlers::instrument_summary),
        )
        .route("/api/portfolio", get(handlers::portfolio))
        .route("/api/frontier", get(handlers::frontier))
        .route("/api/refresh", post(handlers::refresh))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// One refresh cycle over the configured symbols, dated by the local clock.
pub fn run_refresh(state: &AppState) -> Result<RefreshReport, StonkError> {
    let today = chrono::Local::now().date_naive();
    refresh_symbols(
        state.store.as_ref(),
        state.source.as_ref(),
        &state.settings.refresh_symbols(),
        today,
        state.settings.lookback_years,
    )
}

/// Run the refresh cycle now and then every `[refresh] interval_minutes`.
/// Returns `None` when the interval is 0.
pub fn spawn_refresh_task(state: Arc<AppState>) -> Option<tokio::task::JoinHandle<()>> {
    let minutes = state.settings.refresh_interval_minutes;
    if minutes == 0 {
        tracing::info!("scheduled refresh disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let task_state = Arc::clone(&state);
            match tokio::task::spawn_blocking(move || run_refresh(&task_state)).await {
                Ok(Ok(report)) if report.is_degraded() => {
                    tracing::warn!(
                        degraded = report.degraded().len(),
                        "scheduled refresh served cached data for some symbols"
                    );
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::error!("scheduled refresh failed: {e}"),
                Err(e) => tracing::error!("scheduled refresh task panicked: {e}"),
            }
        }
    }))
}
