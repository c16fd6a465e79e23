//! Command handler for Divvy Fetcher CLI
//!
//! Wires the parsed arguments and loaded configuration to the discovery,
//! filter and download stages, and prints the user-facing report.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::app::{
    filter_by_quarter, filter_by_year, ArchiveClient, Catalog, CatalogBuilder, DownloadExecutor,
    DownloadSummary, FileOutcome,
};
use crate::cli::{discovery_spinner, Cli, FetchArgs, ProgressConfig, TransferProgress};
use crate::config::{AppConfig, FetcherConfig};
use crate::errors::{AppError, Result};

/// Handle a fetch run: discover, filter, then list or download
pub async fn handle_fetch(cli: &Cli, mut config: AppConfig) -> Result<()> {
    let args = &cli.fetch;
    args.validate().map_err(AppError::generic)?;

    config.apply_overrides(&args.overrides());
    let fetcher = config.fetcher_config()?;
    let client = ArchiveClient::with_config(config.client_config())?;
    let progress_config = ProgressConfig::for_terminal(cli.global.quiet);

    if args.quarter_ignored() {
        warn!("--quarter has no effect without --year");
    }

    // Discovery
    let discovery_start = Instant::now();
    let builder = CatalogBuilder::new(&client, fetcher.layout.clone(), fetcher.years.clone());
    info!(
        "Probing {} candidate files under {}",
        builder.candidate_count(),
        fetcher.layout.base_url()
    );
    let spinner = discovery_spinner(&progress_config, "Discovering available files...");
    let catalog = builder.build().await;
    spinner.finish_and_clear();
    info!(
        "Discovery completed: {} files in {:?}",
        catalog.len(),
        discovery_start.elapsed()
    );

    if catalog.is_empty() {
        println!("No files found. Please check the URL.");
        return Ok(());
    }
    println!("Found {} files in total", catalog.len());

    let selected = select_files(&catalog, args)?;
    if selected.is_empty() {
        println!("No files match the specified filters.");
        return Ok(());
    }

    println!(
        "Total download size: {:.2} MB",
        selected.total_size_megabytes()
    );

    if args.list_only {
        println!();
        println!("Available files:");
        for line in listing_lines(&selected) {
            println!("{}", line);
        }
        return Ok(());
    }

    download(&client, &selected, &fetcher, progress_config).await
}

/// Apply year then quarter filters, reporting the count after each
fn select_files(catalog: &Catalog, args: &FetchArgs) -> Result<Catalog> {
    let mut selected = catalog.clone();

    if let Some(year) = args.year {
        selected = filter_by_year(&selected, Some(year));
        println!("Filtered by year {}: {} files", year, selected.len());

        if let Some(quarter) = args.quarter {
            selected = filter_by_quarter(&selected, Some(year), Some(quarter))?;
            println!(
                "Filtered by {} Q{}: {} files",
                year,
                quarter,
                selected.len()
            );
        }
    }

    Ok(selected)
}

/// One line per record: `NAME - SIZE MB`
fn listing_lines(catalog: &Catalog) -> Vec<String> {
    catalog.iter().map(ToString::to_string).collect()
}

async fn download(
    client: &ArchiveClient,
    selected: &Catalog,
    fetcher: &FetcherConfig,
    progress_config: ProgressConfig,
) -> Result<()> {
    let output_dir = &fetcher.output_dir;
    tokio::fs::create_dir_all(output_dir).await?;

    println!();
    println!(
        "Downloading {} files to {}",
        selected.len(),
        output_dir.display()
    );

    let started = Instant::now();
    let progress = TransferProgress::new(progress_config);
    let executor = DownloadExecutor::with_observer(client, &progress);
    let summary = executor.download_all(selected.records(), output_dir).await;
    info!(
        "Download session finished in {:?}: {} skipped, {} downloaded, {} failed",
        started.elapsed(),
        summary.skipped(),
        summary.downloaded(),
        summary.failed()
    );

    print_summary(&summary, &absolute_dir(output_dir).await);
    Ok(())
}

fn print_summary(summary: &DownloadSummary, output_dir: &Path) {
    println!();
    println!(
        "Download complete: {} of {} files downloaded",
        summary.succeeded(),
        summary.total()
    );

    if summary.failed() > 0 {
        println!("Failed files:");
        for report in &summary.reports {
            if let FileOutcome::Failed { error } = &report.outcome {
                println!("  {} ({})", report.filename, error);
            }
        }
    }

    println!("Files saved to: {}", output_dir.display());
}

async fn absolute_dir(dir: &Path) -> PathBuf {
    tokio::fs::canonicalize(dir)
        .await
        .unwrap_or_else(|_| dir.to_path_buf())
}
