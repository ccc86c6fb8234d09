//! stonkulator: personal stock dashboard back end.
//!
//! Keeps a local SQLite cache of daily prices for a watchlist, refreshes it
//! incrementally from a market data source, and derives indicators, key
//! statistics, portfolio aggregates and a Monte-Carlo efficient frontier.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
