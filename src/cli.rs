//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvSource;
use crate::adapters::file_config_adapter::load_settings;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::error::StonkError;
use crate::domain::frontier::FrontierResult;
use crate::domain::queries;
use crate::domain::refresh::{refresh_symbols, RefreshStatus};
use crate::domain::settings::{normalize_symbols, Settings};
use crate::ports::store_port::PriceStore;

pub const DEFAULT_CONFIG: &str = "stonkulator.ini";

#[derive(Parser, Debug)]
#[command(name = "stonkulator", about = "Personal stock dashboard back end")]
pub struct Cli {
    /// INI configuration file; defaults apply when it is missing
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch missing daily bars for the watchlist (or the given symbols)
    Refresh {
        symbols: Vec<String>,
        /// Also take every symbol that has a file in the CSV directory
        #[arg(long, conflicts_with = "symbols")]
        all: bool,
    },
    /// Show the stored date range per symbol
    Info { symbol: Option<String> },
    /// List stored instruments
    List,
    /// Key statistics for one symbol
    Summary { symbol: String },
    /// Latest indicator values for one symbol
    Indicators {
        symbol: String,
        /// Number of trailing points to show per indicator
        #[arg(long, default_value_t = 1)]
        last: usize,
    },
    /// Holdings and portfolio return/risk
    Portfolio,
    /// Sample the efficient frontier of the portfolio
    Frontier {
        #[arg(long)]
        samples: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Write every sampled point to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Start the JSON API server
    Serve,
}

/// Everything a command needs: resolved settings, the open store and "today".
pub struct Context {
    pub settings: Settings,
    pub store: SqliteAdapter,
    pub today: NaiveDate,
    pub json: bool,
}

impl Context {
    pub fn open(config: &Path, today: Option<NaiveDate>, json: bool) -> Result<Self, StonkError> {
        let settings = load_settings(config);
        let store = SqliteAdapter::from_settings(&settings)?;
        Ok(Self {
            settings,
            store,
            today: today.unwrap_or_else(|| chrono::Local::now().date_naive()),
            json,
        })
    }

    fn source(&self) -> CsvSource {
        CsvSource::new(&self.settings.csv_dir)
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let ctx = match Context::open(&cli.config, cli.today, cli.json) {
        Ok(ctx) => ctx,
        Err(e) => return fail(&e),
    };

    let result = match cli.command {
        Command::Refresh { symbols, all } => {
            refresh_targets(&ctx, symbols, all).and_then(|targets| run_refresh(&ctx, targets))
        }
        Command::Info { symbol } => run_info(&ctx, symbol),
        Command::List => run_list(&ctx),
        Command::Summary { symbol } => run_summary(&ctx, &symbol),
        Command::Indicators { symbol, last } => run_indicators(&ctx, &symbol, last),
        Command::Portfolio => run_portfolio(&ctx),
        Command::Frontier {
            samples,
            seed,
            output,
        } => run_frontier(&ctx, samples, seed, output.as_deref()),
        Command::Serve => run_serve(ctx),
    };

    match result {
        Ok(code) => code,
        Err(e) => fail(&e),
    }
}

fn fail(err: &StonkError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), StonkError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Symbols for `refresh`: the explicit list, or with `--all` the watchlist
/// plus every symbol in the CSV directory. An empty result means the watchlist.
pub fn refresh_targets(
    ctx: &Context,
    symbols: Vec<String>,
    all: bool,
) -> Result<Vec<String>, StonkError> {
    if !all {
        return Ok(symbols);
    }
    let source = ctx.source();
    let found = source.list_symbols()?;
    tracing::info!(
        dir = %source.base_path().display(),
        files = found.len(),
        "adding every csv symbol"
    );
    let mut targets = ctx.settings.refresh_symbols();
    targets.extend(found);
    Ok(normalize_symbols(targets))
}

pub fn run_refresh(ctx: &Context, symbols: Vec<String>) -> Result<ExitCode, StonkError> {
    let symbols = if symbols.is_empty() {
        ctx.settings.refresh_symbols()
    } else {
        normalize_symbols(symbols)
    };

    let source = ctx.source();
    let report = refresh_symbols(
        &ctx.store,
        &source,
        &symbols,
        ctx.today,
        ctx.settings.lookback_years,
    )?;

    if ctx.json {
        print_json(&report)?;
    } else {
        for outcome in &report.outcomes {
            match &outcome.status {
                RefreshStatus::UpToDate => println!("{}: up to date", outcome.symbol),
                RefreshStatus::Fetched {
                    range,
                    received,
                    inserted,
                } => println!(
                    "{}: {} to {}, {} received, {} new",
                    outcome.symbol, range.start, range.end, received, inserted
                ),
                RefreshStatus::Degraded { reason } => {
                    println!("{}: using cached data ({})", outcome.symbol, reason)
                }
            }
        }
    }

    Ok(if report.is_degraded() {
        ExitCode::from(4)
    } else {
        ExitCode::SUCCESS
    })
}

pub fn run_info(ctx: &Context, symbol: Option<String>) -> Result<ExitCode, StonkError> {
    let symbols = match symbol {
        Some(s) => vec![s.to_uppercase()],
        None => ctx.settings.refresh_symbols(),
    };

    #[derive(Serialize)]
    struct Row {
        symbol: String,
        first_date: Option<NaiveDate>,
        last_date: Option<NaiveDate>,
        bars: usize,
    }

    let mut rows = Vec::new();
    for symbol in symbols {
        let range = ctx.store.data_range(&symbol)?;
        rows.push(Row {
            first_date: range.map(|r| r.0),
            last_date: range.map(|r| r.1),
            bars: range.map_or(0, |r| r.2),
            symbol,
        });
    }

    if ctx.json {
        print_json(&rows)?;
    } else {
        for row in &rows {
            match (row.first_date, row.last_date) {
                (Some(first), Some(last)) => {
                    println!("{}: {} bars, {} to {}", row.symbol, row.bars, first, last)
                }
                _ => eprintln!("{}: no data found", row.symbol),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_list(ctx: &Context) -> Result<ExitCode, StonkError> {
    let instruments = ctx.store.list_instruments()?;
    if ctx.json {
        print_json(&instruments)?;
    } else if instruments.is_empty() {
        eprintln!("No instruments stored; run `stonkulator refresh` first");
    } else {
        for i in &instruments {
            println!(
                "{:<10} {:<10} {:<4} since {}",
                i.symbol, i.market, i.currency, i.first_seen
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_summary(ctx: &Context, symbol: &str) -> Result<ExitCode, StonkError> {
    let s = queries::symbol_summary(&ctx.store, &symbol.to_uppercase())?;
    if ctx.json {
        print_json(&s)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} ({} to {}, {} bars)", s.symbol, s.first_date, s.last_date, s.bar_count);
    println!("  Current price:         {:.2}", s.current_price);
    println!("  Previous close:        {:.2}", s.previous_close);
    println!(
        "  Daily change:          {:+.2} ({:+.2}%)",
        s.daily_change, s.daily_change_pct
    );
    println!("  Period return:         {:+.2}%", s.period_return_pct);
    println!("  Annualized return:     {:+.2}%", s.annualized_return_pct);
    println!("  Annualized volatility: {:.2}%", s.annualized_volatility_pct);
    println!("  Volume:                {}", s.latest_volume);
    println!("  Average volume:        {:.0}", s.average_volume);
    Ok(ExitCode::SUCCESS)
}

pub fn run_indicators(ctx: &Context, symbol: &str, last: usize) -> Result<ExitCode, StonkError> {
    let symbol = symbol.to_uppercase();
    let map = queries::symbol_indicators(&ctx.store, &symbol, &ctx.settings)?;

    if ctx.json {
        let trimmed: Vec<_> = map
            .into_values()
            .map(|mut series| {
                let skip = series.values.len().saturating_sub(last);
                series.values.drain(..skip);
                series
            })
            .collect();
        print_json(&trimmed)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{symbol}");
    for (indicator_type, series) in &map {
        if series.is_empty() {
            println!("  {:<16} not enough history", indicator_type.to_string());
            continue;
        }
        let skip = series.len().saturating_sub(last);
        for point in &series.values[skip..] {
            println!(
                "  {:<16} {} {:.4}",
                indicator_type.to_string(),
                point.date,
                point.value
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn run_portfolio(ctx: &Context) -> Result<ExitCode, StonkError> {
    let stats = queries::portfolio_stats(&ctx.store, &ctx.settings)?;
    if ctx.json {
        print_json(&stats)?;
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{:<8} {:>10} {:>10} {:>12} {:>10} {:>12} {:>8} {:>8}",
        "Symbol", "Qty", "Last", "Value", "Day %", "Total P&L", "Ann. %", "Weight"
    );
    for h in &stats.holdings {
        println!(
            "{:<8} {:>10.2} {:>10.2} {:>12.2} {:>+10.2} {:>+12.2} {:>+8.2} {:>7.1}%",
            if h.stale {
                format!("{}*", h.symbol)
            } else {
                h.symbol.clone()
            },
            h.quantity,
            h.last_close,
            h.market_value,
            h.daily_return * 100.0,
            h.total_pnl,
            h.metrics.annualized_return * 100.0,
            h.weight * 100.0
        );
    }
    println!();
    println!("Market value:          {:.2}", stats.total_market_value);
    println!("Cost:                  {:.2}", stats.total_cost);
    println!(
        "Daily P&L:             {:+.2} ({:+.2}%)",
        stats.daily_pnl,
        stats.daily_return * 100.0
    );
    println!("Total P&L:             {:+.2}", stats.total_pnl);
    println!("Annualized return:     {:+.2}%", stats.metrics.annualized_return * 100.0);
    println!("CAGR:                  {:+.2}%", stats.metrics.cagr * 100.0);
    println!(
        "Annualized volatility: {:.2}%",
        stats.metrics.annualized_volatility * 100.0
    );
    println!("Sharpe ratio:          {:.2}", stats.metrics.sharpe_ratio);
    println!("Max drawdown:          {:.2}%", stats.metrics.max_drawdown * 100.0);
    let stale: Vec<String> = stats
        .holdings
        .iter()
        .filter(|h| h.stale)
        .map(|h| format!("{} ({})", h.symbol, h.last_date))
        .collect();
    if !stale.is_empty() {
        eprintln!(
            "* no bar on {}, left out of daily P&L: {}",
            stats.as_of,
            stale.join(", ")
        );
    }
    if !stats.missing.is_empty() {
        eprintln!("No price data for: {}", stats.missing.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

pub fn write_frontier_csv(result: &FrontierResult, path: &Path) -> Result<(), StonkError> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header: Vec<String> = result.symbols.iter().map(|s| format!("w_{s}")).collect();
    header.extend(["annual_return", "annual_volatility", "sharpe_ratio"].map(String::from));
    writer.write_record(&header)?;

    for point in &result.points {
        let mut record: Vec<String> = point.weights.iter().map(|w| format!("{w:.6}")).collect();
        record.push(format!("{:.6}", point.annual_return));
        record.push(format!("{:.6}", point.annual_volatility));
        record.push(format!("{:.6}", point.sharpe_ratio));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn run_frontier(
    ctx: &Context,
    samples: Option<usize>,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<ExitCode, StonkError> {
    let mut config = ctx.settings.frontier_config();
    if let Some(n) = samples {
        config.samples = n;
    }
    if let Some(s) = seed {
        config.seed = s;
    }

    let result = queries::portfolio_frontier(&ctx.store, &ctx.settings, &config)?;

    if let Some(path) = output {
        write_frontier_csv(&result, path)?;
        eprintln!("Wrote {} points to {}", result.points.len(), path.display());
    }

    if ctx.json {
        print_json(&serde_json::json!({
            "symbols": result.symbols,
            "min_volatility": result.min_volatility_point(),
            "max_sharpe": result.max_sharpe_point(),
            "actual": result.actual,
            "efficient_edge": result.efficient_edge(),
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    let describe = |label: &str, p: &crate::domain::frontier::FrontierPoint| {
        let weights: Vec<String> = result
            .symbols
            .iter()
            .zip(&p.weights)
            .map(|(s, w)| format!("{s} {:.1}%", w * 100.0))
            .collect();
        println!(
            "{label:<16} return {:+.2}%  volatility {:.2}%  sharpe {:.2}  [{}]",
            p.annual_return * 100.0,
            p.annual_volatility * 100.0,
            p.sharpe_ratio,
            weights.join(", ")
        );
    };

    println!(
        "{} portfolios over {}",
        result.points.len(),
        result.symbols.join(", ")
    );
    describe("Min volatility", result.min_volatility_point());
    describe("Max Sharpe", result.max_sharpe_point());
    if let Some(actual) = &result.actual {
        describe("Current", actual);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_serve(ctx: Context) -> Result<ExitCode, StonkError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{build_router_shared, spawn_refresh_task, AppState};
        use std::net::SocketAddr;
        use std::sync::Arc;

        let addr: SocketAddr = ctx.settings.listen.parse().map_err(|_| {
            StonkError::ConfigInvalid {
                section: "web".into(),
                key: "listen".into(),
                reason: format!("'{}' is not a socket address", ctx.settings.listen),
            }
        })?;

        let source = ctx.source();
        let state = Arc::new(AppState {
            store: Arc::new(ctx.store),
            source: Arc::new(source),
            settings: Arc::new(ctx.settings),
        });
        let router = build_router_shared(Arc::clone(&state));

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async move {
            let _refresh = spawn_refresh_task(state);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "serving JSON API");
            axum::serve(listener, router).await
        })?;

        Ok(ExitCode::SUCCESS)
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = ctx;
        eprintln!("error: web feature is required for serve");
        Ok(ExitCode::from(1))
    }
}
