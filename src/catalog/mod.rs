//! Record catalog abstraction for Hente.
//!
//! Provides a trait-based, record-oriented interface over the persistent
//! catalog: channels, videos, transcripts, and derived artifacts.

mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Download state of a catalogued video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadStatus::Pending => write!(f, "pending"),
            DownloadStatus::Downloading => write!(f, "downloading"),
            DownloadStatus::Completed => write!(f, "completed"),
            DownloadStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for DownloadStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DownloadStatus::Pending),
            "downloading" => Ok(DownloadStatus::Downloading),
            "completed" => Ok(DownloadStatus::Completed),
            "failed" => Ok(DownloadStatus::Failed),
            _ => Err(format!("Unknown download status: {}", s)),
        }
    }
}

/// Kind of derivation task run against a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingType {
    Summary,
    Chapters,
    Keywords,
    Insights,
}

impl std::fmt::Display for ProcessingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingType::Summary => write!(f, "summary"),
            ProcessingType::Chapters => write!(f, "chapters"),
            ProcessingType::Keywords => write!(f, "keywords"),
            ProcessingType::Insights => write!(f, "insights"),
        }
    }
}

/// Structured content of one derived artifact, keyed by processing type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactContent {
    Summary { content: String },
    Chapters { content: String },
    Keywords { keywords: Vec<String> },
    Insights { data: serde_json::Value },
}

impl ArtifactContent {
    /// The processing type this content belongs to.
    pub fn processing_type(&self) -> ProcessingType {
        match self {
            ArtifactContent::Summary { .. } => ProcessingType::Summary,
            ArtifactContent::Chapters { .. } => ProcessingType::Chapters,
            ArtifactContent::Keywords { .. } => ProcessingType::Keywords,
            ArtifactContent::Insights { .. } => ProcessingType::Insights,
        }
    }
}

/// A tracked channel row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Internal primary key.
    pub id: i64,
    /// Stable external channel identifier.
    pub channel_id: String,
    /// Human-readable channel name.
    pub channel_name: String,
    /// Canonical channel URL.
    pub channel_url: String,
    /// Whether acquisition should consider this channel.
    pub is_active: bool,
}

/// A catalogued video row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    /// Owning channel's internal primary key.
    pub channel_id: i64,
    /// Stable external video identifier.
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<u32>,
    pub upload_date: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    pub video_url: String,
    pub download_status: DownloadStatus,
    pub downloaded_at: Option<DateTime<Utc>>,
    pub file_path: Option<String>,
}

/// A video row to be inserted before download begins.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub channel_id: i64,
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<u32>,
    pub upload_date: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    pub video_url: String,
    pub download_status: DownloadStatus,
}

/// A stored transcript row.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub id: i64,
    /// Owning video's internal primary key.
    pub video_id: i64,
    pub raw_transcript: String,
    pub transcript_format: String,
    pub word_count: usize,
    pub language: String,
    pub transcribed_at: DateTime<Utc>,
}

/// A transcript row to be inserted.
#[derive(Debug, Clone)]
pub struct NewTranscript {
    /// Owning video's internal primary key.
    pub video_id: i64,
    pub raw_transcript: String,
    pub transcript_format: String,
    pub word_count: usize,
    pub language: String,
    pub transcribed_at: DateTime<Utc>,
}

/// An artifact row to be inserted.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    /// Owning transcript's internal primary key.
    pub transcript_id: i64,
    pub content: ArtifactContent,
    pub model_used: String,
    pub tokens_used: Option<u32>,
    pub processing_time_ms: u64,
}

/// A derived artifact row as stored.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: i64,
    pub transcript_id: i64,
    pub processing_type: ProcessingType,
    pub content: ArtifactContent,
    pub model_used: String,
    pub tokens_used: Option<u32>,
    pub processing_time_ms: u64,
}

/// Trait for the record catalog.
///
/// The catalog is the only shared mutable resource in the system; all
/// operations are single-row inserts or keyed updates, so re-running a
/// pipeline stage is safe as long as callers check existence first.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Insert or update a channel, keyed by its external identifier.
    async fn upsert_channel(
        &self,
        channel_id: &str,
        channel_name: &str,
        channel_url: &str,
        is_active: bool,
    ) -> Result<()>;

    /// All channels currently flagged active.
    async fn active_channels(&self) -> Result<Vec<Channel>>;

    /// Look up a channel by its external identifier.
    async fn find_channel(&self, channel_id: &str) -> Result<Option<Channel>>;

    /// Whether a video with this external identifier is already catalogued.
    async fn video_exists(&self, video_id: &str) -> Result<bool>;

    /// Insert a new video row, returning its internal primary key.
    async fn insert_video(&self, video: &NewVideo) -> Result<i64>;

    /// Record the outcome of a download attempt for a video.
    async fn set_download_result(
        &self,
        id: i64,
        status: DownloadStatus,
        downloaded_at: Option<DateTime<Utc>>,
        file_path: Option<&str>,
    ) -> Result<()>;

    /// Look up a video by its external identifier.
    async fn find_video(&self, video_id: &str) -> Result<Option<Video>>;

    /// Case-insensitive substring search over stored video titles.
    /// Returns the first match.
    async fn find_video_by_title_fragment(&self, fragment: &str) -> Result<Option<Video>>;

    /// Whether a transcript row already exists for this video.
    async fn transcript_exists(&self, video_id: i64) -> Result<bool>;

    /// Insert a transcript row, returning its internal primary key.
    async fn insert_transcript(&self, transcript: &NewTranscript) -> Result<i64>;

    /// The transcript stored for a video, if any.
    async fn find_transcript(&self, video_id: i64) -> Result<Option<Transcript>>;

    /// Insert a derived artifact row, returning its internal primary key.
    async fn insert_artifact(&self, artifact: &NewArtifact) -> Result<i64>;

    /// All artifacts derived from one transcript.
    async fn artifacts_for_transcript(&self, transcript_id: i64) -> Result<Vec<Artifact>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            DownloadStatus::Pending,
            DownloadStatus::Downloading,
            DownloadStatus::Completed,
            DownloadStatus::Failed,
        ] {
            let parsed: DownloadStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<DownloadStatus>().is_err());
    }

    #[test]
    fn test_artifact_content_tagging() {
        let content = ArtifactContent::Keywords {
            keywords: vec!["rust".to_string(), "async".to_string()],
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "keywords");
        assert_eq!(json["keywords"][0], "rust");

        let back: ArtifactContent = serde_json::from_value(json).unwrap();
        assert_eq!(back.processing_type(), ProcessingType::Keywords);
    }
}
