//! `classdiagram` binary: parse arguments, set up logging, run, report.

use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, debug, info};
use miette::GraphicalReportHandler;

use classdiagram_cli::{Args, error_adapter::render_reports, run};

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logger(&args);
    debug!(args:?; "Parsed arguments");

    match run(&args) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            // Reports go straight to stderr so `--log-level off` still shows them.
            let handler = GraphicalReportHandler::new();
            for report in render_reports(&err, &handler) {
                eprintln!("{report}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logger(args: &Args) {
    let level = args.log_filter().unwrap_or_else(|| {
        eprintln!(
            "unknown log level `{}`, falling back to `warn`",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();

    info!(level:?; "Logger initialized");
}
