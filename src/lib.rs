//! Hente - Channel Ingestion and Transcript Derivation
//!
//! A pipeline that tracks a set of external video channels, catalogs and
//! downloads new uploads, and derives structured artifacts (summaries,
//! chapters, keywords, insights) from transcripts as they arrive.
//!
//! The name "Hente" comes from the Norwegian word for "fetch."
//!
//! # Overview
//!
//! Hente allows you to:
//! - Sync a configured list of channels into a local catalog
//! - Discover and download each channel's most recent videos
//! - Watch a folder for transcript files deposited by an external transcriber
//! - Fan each transcript out to several language-model derivation tasks
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt/model tables
//! - `fetch` - Fetch engine abstraction (yt-dlp)
//! - `catalog` - Record catalog abstraction (SQLite)
//! - `registry` - Channel list reconciliation
//! - `acquisition` - Video discovery and download
//! - `matcher` - Transcript filename to video resolution
//! - `inference` - Language-model call contract
//! - `pipeline` - Transcript ingestion and artifact fan-out
//! - `watcher` - Transcript arrival watch loop
//! - `scheduler` - Periodic acquisition runs
//!
//! # Example
//!
//! ```rust,no_run
//! use hente::acquisition::AcquisitionEngine;
//! use hente::catalog::SqliteCatalog;
//! use hente::config::Settings;
//! use hente::fetch::YtDlpEngine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let catalog = Arc::new(SqliteCatalog::new(&settings.sqlite_path())?);
//!     let fetch = Arc::new(YtDlpEngine::new());
//!
//!     let engine = AcquisitionEngine::new(settings, fetch, catalog);
//!     let report = engine.run().await?;
//!     println!("Downloaded {} new videos", report.completed);
//!
//!     Ok(())
//! }
//! ```

pub mod acquisition;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod inference;
pub mod matcher;
pub mod pipeline;
pub mod registry;
pub mod scheduler;
pub mod watcher;

pub use error::{HenteError, Result};
