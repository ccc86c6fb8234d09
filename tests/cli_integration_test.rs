//! CLI integration tests.
//!
//! Tests cover:
//! - Settings resolution from real INI files on disk, including fallbacks
//! - Refresh from a CSV download directory into a SQLite file
//! - Read commands against the refreshed store
//! - Frontier CSV export

mod common;

use common::*;
use std::io::Write;
use std::path::Path;
use stonkulator::adapters::file_config_adapter::load_settings;
use stonkulator::cli::{self, Context};
use stonkulator::domain::error::StonkError;
use stonkulator::domain::gaps::GapPolicy;
use stonkulator::domain::settings::Settings;
use stonkulator::ports::store_port::PriceStore;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

mod config_loading {
    use super::*;

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let settings = load_settings(Path::new("/definitely/not/here.ini"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.symbols, vec!["^GSPC"]);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let file = write_temp_ini("[portfolio\nsymbols = AAPL\n");
        let settings = load_settings(file.path());
        assert_eq!(settings.symbols, Settings::default().symbols);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let file = write_temp_ini(
            "[portfolio]\npositions = aapl:3:100\n[analysis]\ngap_policy = ffill\nseed = x\n",
        );
        let settings = load_settings(file.path());
        assert_eq!(settings.symbols, vec!["^GSPC", "AAPL"]);
        assert_eq!(settings.gap_policy, GapPolicy::ForwardFill { max_fill: 5 });
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.lookback_years, 5);
    }
}

/// A CSV download directory, a SQLite file and an INI tying them together.
struct Workspace {
    _dir: TempDir,
    config: tempfile::NamedTempFile,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let csv_dir = dir.path().join("csv");
        std::fs::create_dir(&csv_dir).unwrap();
        write_csv(&csv_dir, "AAPL", &generate_bars("AAPL", "2024-01-01", 120, 150.0));
        write_csv(&csv_dir, "MSFT", &generate_bars("MSFT", "2024-01-01", 120, 300.0));
        write_csv(&csv_dir, "^GSPC", &generate_bars("^GSPC", "2024-01-01", 120, 4000.0));

        let config = write_temp_ini(&format!(
            "[storage]\npath = {}\n[source]\ncsv_dir = {}\n\
             [portfolio]\nsymbols = AAPL\npositions = AAPL:10:140, MSFT:2:290\n\
             [analysis]\nfrontier_samples = 200\n",
            dir.path().join("prices.db").display(),
            csv_dir.display()
        ));
        Self { _dir: dir, config }
    }

    fn context(&self) -> Context {
        Context::open(self.config.path(), Some(date(2024, 4, 29)), false).unwrap()
    }
}

mod commands {
    use super::*;

    #[test]
    fn refresh_fills_store_from_csv() {
        let ws = Workspace::new();
        let ctx = ws.context();
        assert_eq!(
            ctx.settings.refresh_symbols(),
            vec!["AAPL", "MSFT", "^GSPC"]
        );

        cli::run_refresh(&ctx, Vec::new()).unwrap();
        for symbol in ["AAPL", "MSFT", "^GSPC"] {
            let (_, last, count) = ctx.store.data_range(symbol).unwrap().unwrap();
            assert_eq!(count, 120, "{symbol}");
            assert_eq!(last, date(2024, 4, 29));
        }

        // Store lives in a file: a fresh context sees the same data.
        let again = ws.context();
        cli::run_refresh(&again, Vec::new()).unwrap();
        assert_eq!(again.store.all_bars("AAPL").unwrap().len(), 120);
    }

    #[test]
    fn refresh_with_missing_csv_degrades() {
        let ws = Workspace::new();
        let ctx = ws.context();
        cli::run_refresh(&ctx, vec!["nvda".into()]).unwrap();
        assert!(ctx.store.all_bars("NVDA").unwrap().is_empty());
        assert!(ctx.store.instrument("NVDA").unwrap().is_some());
    }

    #[test]
    fn refresh_all_adds_every_csv_symbol() {
        let ws = Workspace::new();
        let ctx = ws.context();
        write_csv(
            &ctx.settings.csv_dir,
            "NVDA",
            &generate_bars("NVDA", "2024-03-01", 60, 500.0),
        );

        let targets = cli::refresh_targets(&ctx, Vec::new(), true).unwrap();
        assert_eq!(targets, vec!["AAPL", "MSFT", "^GSPC", "NVDA"]);
        assert_eq!(cli::refresh_targets(&ctx, Vec::new(), false).unwrap(), Vec::<String>::new());

        cli::run_refresh(&ctx, targets).unwrap();
        assert_eq!(ctx.store.all_bars("NVDA").unwrap().len(), 60);
    }

    #[test]
    fn read_commands_succeed_after_refresh() {
        let ws = Workspace::new();
        let ctx = ws.context();
        cli::run_refresh(&ctx, Vec::new()).unwrap();

        assert!(cli::run_list(&ctx).is_ok());
        assert!(cli::run_info(&ctx, None).is_ok());
        assert!(cli::run_summary(&ctx, "aapl").is_ok());
        assert!(cli::run_indicators(&ctx, "AAPL", 3).is_ok());
        assert!(cli::run_portfolio(&ctx).is_ok());
    }

    #[test]
    fn summary_of_unknown_symbol_is_no_data() {
        let ws = Workspace::new();
        let ctx = ws.context();
        assert!(matches!(
            cli::run_summary(&ctx, "ZZZZ"),
            Err(StonkError::NoData { .. })
        ));
    }

    #[test]
    fn frontier_writes_csv() {
        let ws = Workspace::new();
        let ctx = ws.context();
        cli::run_refresh(&ctx, Vec::new()).unwrap();

        let out = TempDir::new().unwrap();
        let path = out.path().join("frontier.csv");
        cli::run_frontier(&ctx, Some(50), Some(1), Some(&path)).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["w_AAPL", "w_MSFT", "annual_return", "annual_volatility", "sharpe_ratio"]
        );
        assert_eq!(reader.records().count(), 50);
    }
}
