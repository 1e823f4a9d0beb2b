//! Acquisition scheduler for continuous mode.
//!
//! Runs an acquisition immediately, then again on a fixed interval,
//! checked by a cooperative poll so the shutdown signal is observed
//! promptly. Runs are serialized on this task; a failed run is logged
//! and the schedule continues.

use crate::acquisition::AcquisitionEngine;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{error, info, instrument};

/// Ticking scheduler that enqueues acquisition runs.
pub struct Scheduler {
    engine: Arc<AcquisitionEngine>,
    interval: Duration,
    poll: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<AcquisitionEngine>, interval: Duration, poll: Duration) -> Self {
        Self {
            engine,
            interval,
            poll,
        }
    }

    /// Run acquisitions until the shutdown signal fires.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "Scheduler started; acquisitions will run every {:?}",
            self.interval
        );

        self.run_once().await;
        let mut last_run = Instant::now();

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = sleep(self.poll) => {
                    if last_run.elapsed() >= self.interval {
                        self.run_once().await;
                        last_run = Instant::now();
                    }
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    async fn run_once(&self) {
        info!("Starting scheduled acquisition");
        if let Err(e) = self.engine.run().await {
            error!("Error in scheduled acquisition: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::config::Settings;
    use crate::error::Result;
    use crate::fetch::{ChannelInfo, FetchEngine, MediaEntry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetch {
        list_calls: AtomicUsize,
    }

    #[async_trait]
    impl FetchEngine for CountingFetch {
        async fn resolve_channel(&self, _url: &str) -> Result<ChannelInfo> {
            Ok(ChannelInfo {
                name: "Test Channel".to_string(),
            })
        }

        async fn list_recent(&self, _url: &str, _limit: usize) -> Result<Vec<MediaEntry>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn download(&self, _url: &str, _template: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_runs_immediately_then_on_interval() {
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        let fetch = Arc::new(CountingFetch {
            list_calls: AtomicUsize::new(0),
        });
        let mut settings = Settings::default();
        settings.channels.ids = vec!["abc123".to_string()];

        let engine = Arc::new(AcquisitionEngine::new(settings, fetch.clone(), catalog));
        let scheduler = Scheduler::new(
            engine,
            Duration::from_millis(100),
            Duration::from_millis(10),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stopper = tokio::spawn(async move {
            sleep(Duration::from_millis(380)).await;
            shutdown_tx.send(true).unwrap();
        });

        scheduler.run(shutdown_rx).await.unwrap();
        stopper.await.unwrap();

        // Immediate run plus at least two interval ticks
        let runs = fetch.list_calls.load(Ordering::SeqCst);
        assert!(runs >= 3, "expected at least 3 runs, saw {}", runs);
    }

    #[tokio::test]
    async fn test_stops_on_shutdown_before_first_tick() {
        let catalog = Arc::new(SqliteCatalog::in_memory().unwrap());
        let fetch = Arc::new(CountingFetch {
            list_calls: AtomicUsize::new(0),
        });
        let mut settings = Settings::default();
        settings.channels.ids = vec!["abc123".to_string()];

        let engine = Arc::new(AcquisitionEngine::new(settings, fetch.clone(), catalog));
        let scheduler = Scheduler::new(
            engine,
            Duration::from_secs(3600),
            Duration::from_millis(10),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        scheduler.run(shutdown_rx).await.unwrap();

        // Only the immediate startup run happened
        assert_eq!(fetch.list_calls.load(Ordering::SeqCst), 1);
    }
}
