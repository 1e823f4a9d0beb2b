//! Fetch engine abstraction for Hente.
//!
//! The fetch engine resolves channel metadata, lists a channel's recent
//! uploads, and downloads media. The production implementation shells out
//! to yt-dlp; tests substitute a mock.

mod ytdlp;

pub use ytdlp::YtDlpEngine;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Channel metadata resolved without downloading anything.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    /// Human-readable channel name.
    pub name: String,
}

/// Metadata for one media entry listed from a channel.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    /// Stable external video identifier.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<u32>,
    pub upload_date: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    /// Channel name as reported by the remote source.
    pub channel_name: Option<String>,
}

impl MediaEntry {
    /// Canonical watch URL for this entry.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Trait for the external media-fetch engine.
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Resolve a channel's metadata (no download).
    async fn resolve_channel(&self, channel_url: &str) -> Result<ChannelInfo>;

    /// List up to `limit` of the channel's most recent media entries.
    async fn list_recent(&self, channel_url: &str, limit: usize) -> Result<Vec<MediaEntry>>;

    /// Download a video, writing files per the given output template.
    async fn download(&self, video_url: &str, output_template: &str) -> Result<()>;
}

/// Canonical URL for a channel identifier.
pub fn channel_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/channel/{}", channel_id)
}

/// URL of a channel's uploads listing.
pub fn channel_videos_url(channel_id: &str) -> String {
    format!("{}/videos", channel_url(channel_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_urls() {
        assert_eq!(
            channel_url("abc123"),
            "https://www.youtube.com/channel/abc123"
        );
        assert_eq!(
            channel_videos_url("abc123"),
            "https://www.youtube.com/channel/abc123/videos"
        );
    }

    #[test]
    fn test_watch_url() {
        let entry = MediaEntry {
            id: "dQw4w9WgXcQ".to_string(),
            title: "Test".to_string(),
            description: None,
            duration_seconds: None,
            upload_date: None,
            thumbnail_url: None,
            channel_name: None,
        };
        assert_eq!(
            entry.watch_url(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }
}
