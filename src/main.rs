use clap::Parser;
use stonkulator::cli::{run, Cli};
use tracing::level_filters::LevelFilter;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_level(true)
        .with_target(false)
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}
