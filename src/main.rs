//! WSI Validator - checks slide files for corrupt JPEG tiles.
//!
//! Reports go to stdout, one line per file in the order given. Logs go to
//! stderr.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_validator::{Config, FaultKind, FileReport, OutputFormat, ValidationEngine, Verdict};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let reports = run(&config).await;

    let mut all_valid = true;
    for report in &reports {
        all_valid &= report.is_valid();
        match config.format {
            OutputFormat::Text => println!("{}", report.text(config.verbose)),
            OutputFormat::Json => match report.json() {
                Ok(line) => println!("{}", line),
                Err(e) => {
                    error!(path = %report.path.display(), "Failed to serialize report: {}", e);
                    all_valid = false;
                }
            },
        }
    }

    let failed = reports.iter().filter(|r| !r.is_valid()).count();
    info!(files = reports.len(), failed, "Validation finished");

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Validate every path with at most `config.jobs` files in flight.
async fn run(config: &Config) -> Vec<FileReport> {
    let engine = Arc::new(ValidationEngine::new(config.validate_options()));
    let permits = Arc::new(Semaphore::new(config.jobs));

    let mut handles = Vec::with_capacity(config.paths.len());
    for path in config.paths.iter().cloned() {
        let engine = Arc::clone(&engine);
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            match permits.acquire_owned().await {
                Ok(_permit) => {
                    debug!(path = %path.display(), "Validating");
                    engine.check_path(&path).await
                }
                Err(e) => Verdict::invalid(
                    FaultKind::OpenFailure,
                    format!("Scheduler closed: {}", e),
                ),
            }
        }));
    }

    // Handles are awaited in input order, so reports come out that way too
    let mut reports = Vec::with_capacity(handles.len());
    for (handle, path) in handles.into_iter().zip(&config.paths) {
        let verdict = handle.await.unwrap_or_else(|e| {
            error!(path = %path.display(), "Validation task failed: {}", e);
            Verdict::invalid(FaultKind::OpenFailure, "Validation task aborted")
        });
        reports.push(FileReport::new(path.clone(), verdict));
    }
    reports
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_validator=debug"
    } else {
        "wsi_validator=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
