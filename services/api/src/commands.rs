use crate::cli::PipelineArgs;
use crate::infra::{apply_overrides, load_pipeline};
use clap::Args;
use listing_qualifier::config::AppConfig;
use listing_qualifier::error::AppError;
use listing_qualifier::telemetry::{self, LogSink};
use listing_qualifier::workflows::intake::ListingCsvImporter;
use listing_qualifier::workflows::listing::{BatchOutcome, CancellationFlag};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// RawListing JSON, either inline or a path to a file containing it
    #[arg(long)]
    pub(crate) listing: String,
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Listings CSV (url, text, contact, price, locality, region, latitude, longitude, property_type)
    #[arg(long)]
    pub(crate) csv: PathBuf,
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

pub(crate) async fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = prepare(args.pipeline)?;
    let pipeline = load_pipeline(&config.pipeline)?;

    let payload = listing_payload(&args.listing)?;
    let result = pipeline.run_json(&payload).await?;
    print_json(&result)
}

pub(crate) async fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = prepare(args.pipeline)?;
    let pipeline = load_pipeline(&config.pipeline)?;
    let listings = ListingCsvImporter::from_path(&args.csv)?;

    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; remaining listings will be skipped");
            on_interrupt.cancel();
        }
    });

    let results = pipeline.run_batch(&listings, &cancel).await;
    let valid = results
        .iter()
        .filter(|entry| matches!(&entry.outcome, BatchOutcome::Completed(result) if result.is_valid()))
        .count();
    info!(total = results.len(), valid, "batch finished");

    print_json(&results)
}

fn prepare(args: PipelineArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    apply_overrides(&mut config, args);
    telemetry::init(&config.telemetry, LogSink::Stderr)?;
    Ok(config)
}

/// Inline JSON starts with `{`; anything else is read as a file path.
fn listing_payload(raw: &str) -> Result<Vec<u8>, AppError> {
    if raw.trim_start().starts_with('{') {
        Ok(raw.as_bytes().to_vec())
    } else {
        Ok(std::fs::read(raw)?)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(std::io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}
