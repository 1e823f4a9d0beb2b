//! yt-dlp fetch engine implementation.

use super::{ChannelInfo, FetchEngine, MediaEntry};
use crate::error::{HenteError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Fetch engine backed by the yt-dlp command-line tool.
pub struct YtDlpEngine;

impl YtDlpEngine {
    pub fn new() -> Self {
        Self
    }

    async fn run_ytdlp(args: &[&str]) -> Result<std::process::Output> {
        Command::new("yt-dlp")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HenteError::ToolNotFound("yt-dlp".to_string())
                } else {
                    HenteError::Fetch(format!("Failed to run yt-dlp: {}", e))
                }
            })
    }

    fn parse_entry(json: &serde_json::Value) -> Option<MediaEntry> {
        let id = json["id"].as_str()?.to_string();
        let title = json["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string();

        // yt-dlp returns upload dates as YYYYMMDD
        let upload_date = json["upload_date"].as_str().and_then(|date_str| {
            chrono::NaiveDate::parse_from_str(date_str, "%Y%m%d").ok()
        });

        Some(MediaEntry {
            id,
            title,
            description: json["description"].as_str().map(|s| s.to_string()),
            duration_seconds: json["duration"].as_f64().map(|d| d as u32),
            upload_date,
            thumbnail_url: json["thumbnail"].as_str().map(|s| s.to_string()),
            channel_name: json["channel"]
                .as_str()
                .or_else(|| json["uploader"].as_str())
                .map(|s| s.to_string()),
        })
    }
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchEngine for YtDlpEngine {
    #[instrument(skip(self))]
    async fn resolve_channel(&self, channel_url: &str) -> Result<ChannelInfo> {
        let output = Self::run_ytdlp(&[
            "--dump-single-json",
            "--flat-playlist",
            "--playlist-items",
            "0",
            "--no-warnings",
            channel_url,
        ])
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HenteError::Fetch(format!(
                "Failed to resolve channel {}: {}",
                channel_url, stderr
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| HenteError::Fetch(format!("Failed to parse yt-dlp output: {}", e)))?;

        let name = json["channel"]
            .as_str()
            .or_else(|| json["uploader"].as_str())
            .or_else(|| json["title"].as_str())
            .unwrap_or(channel_url)
            .to_string();

        Ok(ChannelInfo { name })
    }

    #[instrument(skip(self))]
    async fn list_recent(&self, channel_url: &str, limit: usize) -> Result<Vec<MediaEntry>> {
        let limit_str = limit.to_string();

        let output = Self::run_ytdlp(&[
            "--dump-json",
            "--no-download",
            "--no-warnings",
            "--ignore-errors",
            "--playlist-end",
            &limit_str,
            channel_url,
        ])
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HenteError::Fetch(format!(
                "Failed to list videos for {}: {}",
                channel_url, stderr
            )));
        }

        // One JSON document per line, one line per entry
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut entries = Vec::new();

        for line in stdout.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if let Ok(json) = serde_json::from_str::<serde_json::Value>(line) {
                if let Some(entry) = Self::parse_entry(&json) {
                    entries.push(entry);
                } else {
                    debug!("Skipping listing entry without an id");
                }
            }
        }

        Ok(entries)
    }

    #[instrument(skip(self, output_template))]
    async fn download(&self, video_url: &str, output_template: &str) -> Result<()> {
        let output = Self::run_ytdlp(&[
            "--format",
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
            "--output",
            output_template,
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "192K",
            "--keep-video",
            "--write-thumbnail",
            "--write-info-json",
            "--no-playlist",
            "--no-warnings",
            video_url,
        ])
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HenteError::Download(format!(
                "yt-dlp failed for {}: {}",
                video_url, stderr
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry() {
        let json = serde_json::json!({
            "id": "dQw4w9WgXcQ",
            "title": "A Video",
            "description": "About things",
            "duration": 212.0,
            "upload_date": "20240101",
            "thumbnail": "https://example.com/t.jpg",
            "channel": "Test Channel"
        });

        let entry = YtDlpEngine::parse_entry(&json).unwrap();
        assert_eq!(entry.id, "dQw4w9WgXcQ");
        assert_eq!(entry.title, "A Video");
        assert_eq!(entry.duration_seconds, Some(212));
        assert_eq!(
            entry.upload_date,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(entry.channel_name.as_deref(), Some("Test Channel"));
    }

    #[test]
    fn test_parse_entry_requires_id() {
        let json = serde_json::json!({ "title": "No id here" });
        assert!(YtDlpEngine::parse_entry(&json).is_none());
    }

    #[test]
    fn test_parse_entry_bad_date_ignored() {
        let json = serde_json::json!({
            "id": "abc",
            "title": "T",
            "upload_date": "not-a-date"
        });
        let entry = YtDlpEngine::parse_entry(&json).unwrap();
        assert!(entry.upload_date.is_none());
    }
}
