//! Acquisition engine: discovers and downloads new videos for active channels.

use crate::catalog::{Catalog, DownloadStatus, NewVideo};
use crate::config::Settings;
use crate::error::Result;
use crate::fetch::{channel_videos_url, FetchEngine, MediaEntry};
use crate::registry::ChannelRegistry;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Counts from one acquisition run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    /// Active channels considered.
    pub channels: usize,
    /// New video rows inserted.
    pub inserted: usize,
    /// Downloads that finished successfully.
    pub completed: usize,
    /// Downloads that failed.
    pub failed: usize,
    /// Entries skipped because they were already catalogued.
    pub skipped: usize,
}

/// Discovers each active channel's recent uploads and downloads new ones.
pub struct AcquisitionEngine {
    settings: Settings,
    fetch: Arc<dyn FetchEngine>,
    catalog: Arc<dyn Catalog>,
}

impl AcquisitionEngine {
    pub fn new(
        settings: Settings,
        fetch: Arc<dyn FetchEngine>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            settings,
            fetch,
            catalog,
        }
    }

    /// Sync the configured channel list, then acquire each active channel's
    /// recent uploads.
    ///
    /// Only the channel's `max_videos_per_run` most recent entries are
    /// considered, so a long-inactive channel will not backfill older
    /// uploads. A failing channel is logged and the rest still run.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunReport> {
        info!("Starting acquisition run");

        let registry = ChannelRegistry::new(self.fetch.clone(), self.catalog.clone());
        registry.sync(&self.settings.channels.ids).await?;

        let channels = self.catalog.active_channels().await?;
        let mut report = RunReport {
            channels: channels.len(),
            ..RunReport::default()
        };

        for channel in &channels {
            info!("Processing channel: {}", channel.channel_id);
            match self.acquire_channel(channel.id, &channel.channel_id).await {
                Ok(channel_report) => {
                    report.inserted += channel_report.inserted;
                    report.completed += channel_report.completed;
                    report.failed += channel_report.failed;
                    report.skipped += channel_report.skipped;
                }
                Err(e) => {
                    error!("Error processing channel {}: {}", channel.channel_id, e);
                }
            }
        }

        info!(
            "Acquisition run finished: {} new, {} completed, {} failed, {} skipped",
            report.inserted, report.completed, report.failed, report.skipped
        );

        Ok(report)
    }

    async fn acquire_channel(&self, channel_db_id: i64, channel_id: &str) -> Result<RunReport> {
        let listing_url = channel_videos_url(channel_id);
        let limit = self.settings.download.max_videos_per_run;

        let entries = self.fetch.list_recent(&listing_url, limit).await?;
        let mut report = RunReport::default();

        for entry in entries.iter().take(limit) {
            if self.catalog.video_exists(&entry.id).await? {
                info!("Video {} already catalogued, skipping", entry.id);
                report.skipped += 1;
                continue;
            }

            let video_db_id = self
                .catalog
                .insert_video(&NewVideo {
                    channel_id: channel_db_id,
                    video_id: entry.id.clone(),
                    title: entry.title.clone(),
                    description: entry.description.clone(),
                    duration_seconds: entry.duration_seconds,
                    upload_date: entry.upload_date,
                    thumbnail_url: entry.thumbnail_url.clone(),
                    video_url: entry.watch_url(),
                    download_status: DownloadStatus::Downloading,
                })
                .await?;
            report.inserted += 1;

            info!("Downloading: {}", entry.title);

            match self
                .fetch
                .download(&entry.watch_url(), &self.output_template())
                .await
            {
                Ok(()) => {
                    let file_path = self.resolved_path(entry);
                    self.catalog
                        .set_download_result(
                            video_db_id,
                            DownloadStatus::Completed,
                            Some(Utc::now()),
                            Some(&file_path),
                        )
                        .await?;
                    report.completed += 1;
                }
                Err(e) => {
                    error!("Error downloading video {}: {}", entry.id, e);
                    self.catalog
                        .set_download_result(video_db_id, DownloadStatus::Failed, None, None)
                        .await?;
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// yt-dlp output template rooted at the watched folder, so transcripts
    /// deposited next to downloads share the `<date>_<title>` convention.
    fn output_template(&self) -> String {
        format!(
            "{}/%(channel)s/%(upload_date)s_%(title)s.%(ext)s",
            self.settings.watched_folder().display()
        )
    }

    /// Path the downloaded video is expected to land at.
    fn resolved_path(&self, entry: &MediaEntry) -> String {
        let channel = entry.channel_name.as_deref().unwrap_or("unknown");
        let date = entry
            .upload_date
            .map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_default();
        format!(
            "{}/{}/{}_{}.mp4",
            self.settings.watched_folder().display(),
            channel,
            date,
            entry.title
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::error::HenteError;
    use crate::fetch::ChannelInfo;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetch engine returning canned listings, with selectable download failures.
    pub(crate) struct MockFetch {
        pub entries: Vec<MediaEntry>,
        pub failing_downloads: Vec<String>,
        pub download_attempts: AtomicUsize,
    }

    impl MockFetch {
        pub fn with_entries(entries: Vec<MediaEntry>) -> Self {
            Self {
                entries,
                failing_downloads: Vec::new(),
                download_attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FetchEngine for MockFetch {
        async fn resolve_channel(&self, _url: &str) -> Result<ChannelInfo> {
            Ok(ChannelInfo {
                name: "Test Channel".to_string(),
            })
        }

        async fn list_recent(&self, _url: &str, limit: usize) -> Result<Vec<MediaEntry>> {
            Ok(self.entries.iter().take(limit).cloned().collect())
        }

        async fn download(&self, video_url: &str, _template: &str) -> Result<()> {
            self.download_attempts.fetch_add(1, Ordering::SeqCst);
            if self
                .failing_downloads
                .iter()
                .any(|id| video_url.contains(id.as_str()))
            {
                return Err(HenteError::Download("simulated failure".to_string()));
            }
            Ok(())
        }
    }

    pub(crate) fn entry(id: &str, title: &str) -> MediaEntry {
        MediaEntry {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            duration_seconds: Some(300),
            upload_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            thumbnail_url: None,
            channel_name: Some("Test Channel".to_string()),
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.channels.ids = vec!["abc123".to_string()];
        settings
    }

    #[tokio::test]
    async fn test_partial_failure_scenario() {
        // 3 remote entries, 1 already catalogued, 1 download failure
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        catalog
            .upsert_channel("abc123", "Test Channel", "url", true)
            .await
            .unwrap();
        let channel = catalog.find_channel("abc123").await.unwrap().unwrap();
        catalog
            .insert_video(&NewVideo {
                channel_id: channel.id,
                video_id: "vid1".to_string(),
                title: "Already Here".to_string(),
                description: None,
                duration_seconds: None,
                upload_date: None,
                thumbnail_url: None,
                video_url: "https://www.youtube.com/watch?v=vid1".to_string(),
                download_status: DownloadStatus::Completed,
            })
            .await
            .unwrap();

        let fetch = Arc::new(MockFetch {
            entries: vec![entry("vid1", "Already Here"), entry("vid2", "Two"), entry("vid3", "Three")],
            failing_downloads: vec!["vid3".to_string()],
            download_attempts: AtomicUsize::new(0),
        });

        let engine = AcquisitionEngine::new(settings(), fetch.clone(), catalog.clone());
        let report = engine.run().await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(fetch.download_attempts.load(Ordering::SeqCst), 2);

        let ok = catalog.find_video("vid2").await.unwrap().unwrap();
        assert_eq!(ok.download_status, DownloadStatus::Completed);
        assert!(ok.file_path.is_some());

        let bad = catalog.find_video("vid3").await.unwrap().unwrap();
        assert_eq!(bad.download_status, DownloadStatus::Failed);
        assert!(bad.file_path.is_none());
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        let fetch = Arc::new(MockFetch::with_entries(vec![
            entry("vid1", "One"),
            entry("vid2", "Two"),
        ]));

        let engine = AcquisitionEngine::new(settings(), fetch.clone(), catalog.clone());

        let first = engine.run().await.unwrap();
        assert_eq!(first.inserted, 2);

        let second = engine.run().await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);
        // No re-download either
        assert_eq!(fetch.download_attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listing_cap_bounds_work() {
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        let entries: Vec<MediaEntry> = (0..20)
            .map(|i| entry(&format!("vid{}", i), &format!("Video {}", i)))
            .collect();
        let fetch = Arc::new(MockFetch::with_entries(entries));

        let mut settings = settings();
        settings.download.max_videos_per_run = 5;

        let engine = AcquisitionEngine::new(settings, fetch, catalog.clone());
        let report = engine.run().await.unwrap();

        assert_eq!(report.inserted, 5);
    }
}
