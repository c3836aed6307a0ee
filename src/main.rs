mod cli;
mod exit_codes;
mod report;

use clap::Parser;
use log::error;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let Some(root) = cli.root.as_deref() else {
        error!("Please provide the Parkinson's data directory path");
        std::process::exit(exit_codes::USAGE_ERROR);
    };

    let exit_code = match report::run(root, &cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            exit_codes::EXECUTION_ERROR
        }
    };
    std::process::exit(exit_code);
}
