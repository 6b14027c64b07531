//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads settings
//! - installs the log subscriber
//! - builds the selected source adapter
//! - runs the fetch -> align -> derive -> render -> write pipeline

use chrono::Local;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Settings;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `liquidity-report` binary.
///
/// A no-data report is still a successful run; only settings and output
/// failures produce an error.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging();

    let settings = settings_from_cli(&cli)?;
    info!(
        source = cli.source.display_name(),
        lookback = settings.lookback,
        "starting liquidity report run"
    );
    let adapter = crate::data::build_adapter(cli.source, &settings)?;

    let outcome = pipeline::run_report(adapter.as_ref(), &settings, Local::now().naive_local())?;
    match &outcome {
        pipeline::ReportOutcome::Full { table, kpis, .. } => info!(
            path = %settings.output.display(),
            rows = table.len(),
            as_of = %kpis.as_of,
            "report written"
        ),
        pipeline::ReportOutcome::NoData { reason, .. } => warn!(
            path = %settings.output.display(),
            "no-data report written: {reason}"
        ),
    }

    Ok(())
}

/// Merge CLI overrides on top of the (optional) settings file.
pub fn settings_from_cli(cli: &Cli) -> Result<Settings, AppError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(output) = &cli.output {
        settings.output = output.clone();
    }
    if let Some(lookback) = cli.lookback {
        settings.lookback = lookback;
    }
    Ok(settings)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore the error if a subscriber is already installed (e.g. under tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
