use crate::commands::{run_batch, run_validate, BatchArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use listing_qualifier::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Listing Qualifier",
    about = "Validate, disclose and score scraped Thai/English property listings",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Validate a single listing and print the result as JSON
    Validate(ValidateArgs),
    /// Validate every row of a listings CSV and print the batch results as JSON
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) pipeline: PipelineArgs,
}

/// Overrides for `LISTING_PIPELINE_CONFIG` and `LISTING_GEO_TABLE`.
#[derive(Args, Debug, Default)]
pub(crate) struct PipelineArgs {
    /// Pipeline configuration JSON (dictionary, segments, weights)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Geo-risk locality table CSV
    #[arg(long)]
    pub(crate) geo_table: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Validate(args) => run_validate(args).await,
        Command::Batch(args) => run_batch(args).await,
    }
}
