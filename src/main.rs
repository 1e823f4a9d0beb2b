//! Hente CLI entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use hente::acquisition::AcquisitionEngine;
use hente::catalog::SqliteCatalog;
use hente::config::{DerivationPrompts, Settings};
use hente::fetch::YtDlpEngine;
use hente::inference::OpenAiInference;
use hente::pipeline::{ArtifactPipeline, IngestOutcome};
use hente::scheduler::Scheduler;
use hente::watcher::WatchLoop;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Hente - Channel Ingestion and Transcript Derivation
///
/// Tracks a set of video channels, downloads new uploads into a watched
/// folder, and derives summaries, chapters, keywords, and insights from
/// transcripts as they arrive.
#[derive(Parser, Debug)]
#[command(name = "hente")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one acquisition pass and exit (for external schedulers)
    Sync,

    /// Run continuously: scheduled acquisitions plus the transcript watch loop
    Run,

    /// Run the artifact pipeline on a single transcript file
    Ingest {
        /// Path to the transcript file
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first so its log level can seed the filter
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("hente={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.download_path())?;
    std::fs::create_dir_all(settings.watched_folder())?;

    let catalog = Arc::new(SqliteCatalog::new(&settings.sqlite_path())?);
    let fetch = Arc::new(YtDlpEngine::new());

    match &cli.command {
        Commands::Sync => {
            let engine = AcquisitionEngine::new(settings, fetch, catalog);
            let report = engine.run().await?;
            info!(
                "Sync complete: {} new videos ({} completed, {} failed)",
                report.inserted, report.completed, report.failed
            );
        }

        Commands::Run => {
            let prompts = DerivationPrompts::load()?;
            let inference = Arc::new(OpenAiInference::new());
            let pipeline = Arc::new(ArtifactPipeline::new(
                catalog.clone(),
                inference,
                prompts,
                settings.processing.clone(),
            ));

            let watch_loop = WatchLoop::new(
                settings.watched_folder(),
                Duration::from_secs(settings.download.settle_delay_seconds),
                catalog.clone(),
                pipeline,
            );

            let engine = Arc::new(AcquisitionEngine::new(
                settings.clone(),
                fetch,
                catalog,
            ));
            let scheduler = Scheduler::new(
                engine,
                Duration::from_secs(settings.schedule.interval_hours * 3600),
                Duration::from_secs(settings.schedule.poll_seconds),
            );

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Interrupt received, shutting down");
                let _ = shutdown_tx.send(true);
            });

            let watcher_handle = {
                let rx = shutdown_rx.clone();
                tokio::spawn(async move { watch_loop.run(rx).await })
            };

            scheduler.run(shutdown_rx).await?;
            watcher_handle.await??;
        }

        Commands::Ingest { path } => {
            let prompts = DerivationPrompts::load()?;
            let inference = Arc::new(OpenAiInference::new());
            let pipeline = ArtifactPipeline::new(
                catalog,
                inference,
                prompts,
                settings.processing.clone(),
            );

            match pipeline.ingest(&PathBuf::from(path)).await? {
                IngestOutcome::Ingested(id) => {
                    info!("Ingested transcript {} from {}", id, path);
                }
                IngestOutcome::Unmatched => {
                    info!("No catalogued video matched {}", path);
                }
            }
        }
    }

    Ok(())
}
