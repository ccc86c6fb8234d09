//! Core domain types and logic.

pub mod error;
pub mod freshness;
pub mod frontier;
pub mod gaps;
pub mod indicator;
pub mod indicator_helpers;
pub mod instrument;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod queries;
pub mod refresh;
pub mod settings;
pub mod summary;
