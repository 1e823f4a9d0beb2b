//! Watch loop: detects transcript arrivals and feeds the artifact pipeline.
//!
//! On startup the watched folder is scanned for artifacts that arrived
//! while the process was down, then a filesystem subscription handles live
//! arrivals. Event delivery is not exactly-once, so every artifact passes
//! an existence check before ingestion; duplicate or replayed events
//! become no-ops.

use crate::catalog::Catalog;
use crate::error::{HenteError, Result};
use crate::matcher::{is_transcript_artifact, TranscriptMatcher};
use crate::pipeline::ArtifactPipeline;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Long-lived transcript watch loop.
pub struct WatchLoop {
    watched_folder: PathBuf,
    settle_delay: Duration,
    catalog: Arc<dyn Catalog>,
    matcher: TranscriptMatcher,
    pipeline: Arc<ArtifactPipeline>,
}

impl WatchLoop {
    pub fn new(
        watched_folder: PathBuf,
        settle_delay: Duration,
        catalog: Arc<dyn Catalog>,
        pipeline: Arc<ArtifactPipeline>,
    ) -> Self {
        let matcher = TranscriptMatcher::new(catalog.clone());
        Self {
            watched_folder,
            settle_delay,
            catalog,
            matcher,
            pipeline,
        }
    }

    /// Reconcile already-arrived artifacts, then watch for new ones until
    /// the shutdown signal fires.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        std::fs::create_dir_all(&self.watched_folder)?;

        self.reconcile().await?;

        let (tx, mut rx) = mpsc::channel::<PathBuf>(100);

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_)) {
                        return;
                    }
                    for path in event.paths {
                        if is_transcript_artifact(&path) {
                            let _ = tx.blocking_send(path);
                        }
                    }
                }
                Err(e) => error!("Watch error: {}", e),
            })
            .map_err(|e| HenteError::Watch(e.to_string()))?;

        watcher
            .watch(&self.watched_folder, RecursiveMode::Recursive)
            .map_err(|e| HenteError::Watch(e.to_string()))?;

        info!("Watching for transcripts in: {:?}", self.watched_folder);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                path = rx.recv() => {
                    let Some(path) = path else { break };
                    info!("New transcript detected: {:?}", path);
                    // Let the producer finish writing before reading
                    sleep(self.settle_delay).await;
                    self.process_artifact(&path).await;
                }
            }
        }

        // Dropping the watcher ends the subscription
        info!("Watch loop stopped");
        Ok(())
    }

    /// Scan the watched folder for artifacts that have not been ingested.
    #[instrument(skip_all)]
    pub async fn reconcile(&self) -> Result<()> {
        info!(
            "Scanning for existing transcripts in {:?}",
            self.watched_folder
        );

        let paths: Vec<PathBuf> = walkdir::WalkDir::new(&self.watched_folder)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_transcript_artifact(p))
            .collect();

        for path in paths {
            self.process_artifact(&path).await;
        }

        Ok(())
    }

    /// Ingest one artifact unless its video already has a transcript.
    ///
    /// This existence check is what makes duplicate and late filesystem
    /// events safe.
    pub async fn process_artifact(&self, path: &Path) {
        let video = match self.matcher.match_transcript(path).await {
            Ok(Some(video)) => video,
            Ok(None) => {
                warn!("No catalogued video for transcript: {:?}", path);
                return;
            }
            Err(e) => {
                error!("Error matching transcript {:?}: {}", path, e);
                return;
            }
        };

        match self.catalog.transcript_exists(video.id).await {
            Ok(true) => {
                debug!("Transcript already ingested for video {}", video.video_id);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                error!("Error checking transcript for {}: {}", video.video_id, e);
                return;
            }
        }

        if let Err(e) = self.pipeline.ingest(path).await {
            error!("Error processing transcript {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DownloadStatus, NewVideo, SqliteCatalog};
    use crate::config::{DerivationPrompts, ProcessingSettings};
    use crate::pipeline::tests::MockInference;

    async fn fixture(title: &str) -> (Arc<SqliteCatalog>, i64, Arc<MockInference>) {
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        catalog
            .upsert_channel("abc123", "Test Channel", "url", true)
            .await
            .unwrap();
        let channel = catalog.find_channel("abc123").await.unwrap().unwrap();
        let video_id = catalog
            .insert_video(&NewVideo {
                channel_id: channel.id,
                video_id: "vid001".to_string(),
                title: title.to_string(),
                description: None,
                duration_seconds: None,
                upload_date: None,
                thumbnail_url: None,
                video_url: "https://www.youtube.com/watch?v=vid001".to_string(),
                download_status: DownloadStatus::Completed,
            })
            .await
            .unwrap();
        (catalog, video_id, Arc::new(MockInference::new()))
    }

    fn build_watch_loop(
        folder: &Path,
        catalog: Arc<SqliteCatalog>,
        inference: Arc<MockInference>,
    ) -> WatchLoop {
        let pipeline = Arc::new(ArtifactPipeline::new(
            catalog.clone(),
            inference,
            DerivationPrompts::default(),
            ProcessingSettings::default(),
        ));
        WatchLoop::new(folder.to_path_buf(), Duration::from_millis(0), catalog, pipeline)
    }

    #[tokio::test]
    async fn test_reconcile_ingests_existing_artifact_once() {
        let (catalog, video_id, inference) = fixture("Intro to Systems").await;

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Test Channel");
        std::fs::create_dir_all(&nested).unwrap();
        let artifact = nested.join("20240101_Intro_to_Systems_transcript.txt");
        std::fs::write(&artifact, "hello world").unwrap();

        let watch_loop = build_watch_loop(dir.path(), catalog.clone(), inference);

        watch_loop.reconcile().await.unwrap();
        assert!(catalog.transcript_exists(video_id).await.unwrap());

        // A duplicate live event for the same artifact is a no-op
        watch_loop.process_artifact(&artifact).await;

        let transcript = catalog.find_transcript(video_id).await.unwrap().unwrap();
        let artifacts = catalog
            .artifacts_for_transcript(transcript.id)
            .await
            .unwrap();
        assert_eq!(artifacts.len(), 4);
    }

    #[tokio::test]
    async fn test_reconcile_skips_unmatched_and_foreign_files() {
        let (catalog, video_id, inference) = fixture("Intro to Systems").await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a transcript").unwrap();
        std::fs::write(
            dir.path().join("20240101_Unrelated_Talk_transcript.txt"),
            "unmatched",
        )
        .unwrap();

        let watch_loop = build_watch_loop(dir.path(), catalog.clone(), inference);
        watch_loop.reconcile().await.unwrap();

        assert!(!catalog.transcript_exists(video_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_live_event_ingests_new_artifact() {
        let (catalog, video_id, inference) = fixture("Intro to Systems").await;

        let dir = tempfile::tempdir().unwrap();
        let watch_loop = build_watch_loop(dir.path(), catalog.clone(), inference);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let artifact = dir.path().join("20240101_Intro_to_Systems_transcript.txt");
        let writer = {
            let artifact = artifact.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(200)).await;
                std::fs::write(&artifact, "hello world").unwrap();
                sleep(Duration::from_millis(700)).await;
                shutdown_tx.send(true).unwrap();
            })
        };

        watch_loop.run(shutdown_rx).await.unwrap();
        writer.await.unwrap();

        assert!(catalog.transcript_exists(video_id).await.unwrap());
    }
}
