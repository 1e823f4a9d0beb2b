//! SQLite-based catalog implementation.
//!
//! Uses a single connection behind a mutex. All writes are single-row
//! inserts or keyed updates, relying on SQLite's per-statement atomicity.

use super::{
    Artifact, ArtifactContent, Catalog, Channel, DownloadStatus, NewArtifact, NewTranscript,
    NewVideo, ProcessingType, Transcript, Video,
};
use crate::error::{HenteError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS channels (
        id INTEGER PRIMARY KEY,
        channel_id TEXT NOT NULL UNIQUE,
        channel_name TEXT NOT NULL,
        channel_url TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS videos (
        id INTEGER PRIMARY KEY,
        channel_id INTEGER NOT NULL REFERENCES channels(id),
        video_id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        description TEXT,
        duration_seconds INTEGER,
        upload_date TEXT,
        thumbnail_url TEXT,
        video_url TEXT NOT NULL,
        download_status TEXT NOT NULL,
        downloaded_at TEXT,
        file_path TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_videos_channel_id ON videos(channel_id);
    CREATE INDEX IF NOT EXISTS idx_videos_title ON videos(title);

    CREATE TABLE IF NOT EXISTS transcripts (
        id INTEGER PRIMARY KEY,
        video_id INTEGER NOT NULL REFERENCES videos(id),
        raw_transcript TEXT NOT NULL,
        transcript_format TEXT NOT NULL,
        word_count INTEGER NOT NULL,
        language TEXT NOT NULL,
        transcribed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_transcripts_video_id ON transcripts(video_id);

    CREATE TABLE IF NOT EXISTS artifacts (
        id INTEGER PRIMARY KEY,
        transcript_id INTEGER NOT NULL REFERENCES transcripts(id),
        processing_type TEXT NOT NULL,
        content TEXT NOT NULL,
        model_used TEXT NOT NULL,
        tokens_used INTEGER,
        processing_time_ms INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_artifacts_transcript_id ON artifacts(transcript_id);
"#;

/// SQLite-backed catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (or create) a catalog database at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized catalog at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory catalog (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HenteError::Catalog(format!("Failed to acquire lock: {}", e)))
    }

    fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
        let status: String = row.get("download_status")?;
        let upload_date: Option<String> = row.get("upload_date")?;
        let downloaded_at: Option<String> = row.get("downloaded_at")?;

        Ok(Video {
            id: row.get("id")?,
            channel_id: row.get("channel_id")?,
            video_id: row.get("video_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            duration_seconds: row.get("duration_seconds")?,
            upload_date: upload_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            thumbnail_url: row.get("thumbnail_url")?,
            video_url: row.get("video_url")?,
            download_status: status.parse().unwrap_or(DownloadStatus::Pending),
            downloaded_at: downloaded_at
                .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
                .map(|d| d.with_timezone(&Utc)),
            file_path: row.get("file_path")?,
        })
    }

    fn channel_from_row(row: &Row<'_>) -> rusqlite::Result<Channel> {
        Ok(Channel {
            id: row.get("id")?,
            channel_id: row.get("channel_id")?,
            channel_name: row.get("channel_name")?,
            channel_url: row.get("channel_url")?,
            is_active: row.get("is_active")?,
        })
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    #[instrument(skip(self))]
    async fn upsert_channel(
        &self,
        channel_id: &str,
        channel_name: &str,
        channel_url: &str,
        is_active: bool,
    ) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO channels (channel_id, channel_name, channel_url, is_active)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(channel_id) DO UPDATE SET
                channel_name = excluded.channel_name,
                channel_url = excluded.channel_url,
                is_active = excluded.is_active
            "#,
            params![channel_id, channel_name, channel_url, is_active],
        )?;

        Ok(())
    }

    async fn active_channels(&self) -> Result<Vec<Channel>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, channel_id, channel_name, channel_url, is_active
             FROM channels WHERE is_active = 1 ORDER BY id",
        )?;

        let channels = stmt
            .query_map([], Self::channel_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(channels)
    }

    async fn find_channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, channel_id, channel_name, channel_url, is_active
             FROM channels WHERE channel_id = ?1",
        )?;

        let mut rows = stmt.query_map(params![channel_id], Self::channel_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn video_exists(&self, video_id: &str) -> Result<bool> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM videos WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    #[instrument(skip(self, video), fields(video_id = %video.video_id))]
    async fn insert_video(&self, video: &NewVideo) -> Result<i64> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO videos
            (channel_id, video_id, title, description, duration_seconds, upload_date,
             thumbnail_url, video_url, download_status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                video.channel_id,
                video.video_id,
                video.title,
                video.description,
                video.duration_seconds,
                video.upload_date.map(|d| d.format("%Y-%m-%d").to_string()),
                video.thumbnail_url,
                video.video_url,
                video.download_status.to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn set_download_result(
        &self,
        id: i64,
        status: DownloadStatus,
        downloaded_at: Option<DateTime<Utc>>,
        file_path: Option<&str>,
    ) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "UPDATE videos SET download_status = ?2, downloaded_at = ?3, file_path = ?4
             WHERE id = ?1",
            params![
                id,
                status.to_string(),
                downloaded_at.map(|d| d.to_rfc3339()),
                file_path,
            ],
        )?;

        Ok(())
    }

    async fn find_video(&self, video_id: &str) -> Result<Option<Video>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT * FROM videos WHERE video_id = ?1")?;
        let mut rows = stmt.query_map(params![video_id], Self::video_from_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn find_video_by_title_fragment(&self, fragment: &str) -> Result<Option<Video>> {
        let conn = self.lock()?;

        // LIKE is case-insensitive for ASCII by default. `%` is escaped so
        // fragments match literally, but `_` is deliberately left as a
        // single-character wildcard: transcript names carry underscores
        // where the stored title has spaces.
        let escaped = fragment.replace('\\', "\\\\").replace('%', "\\%");
        let pattern = format!("%{}%", escaped);

        let mut stmt = conn.prepare(
            "SELECT * FROM videos WHERE title LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![pattern], Self::video_from_row)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn transcript_exists(&self, video_id: i64) -> Result<bool> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transcripts WHERE video_id = ?1",
            params![video_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    #[instrument(skip(self, transcript), fields(video_id = transcript.video_id))]
    async fn insert_transcript(&self, transcript: &NewTranscript) -> Result<i64> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO transcripts
            (video_id, raw_transcript, transcript_format, word_count, language, transcribed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                transcript.video_id,
                transcript.raw_transcript,
                transcript.transcript_format,
                transcript.word_count,
                transcript.language,
                transcript.transcribed_at.to_rfc3339(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn find_transcript(&self, video_id: i64) -> Result<Option<Transcript>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, video_id, raw_transcript, transcript_format, word_count,
                    language, transcribed_at
             FROM transcripts WHERE video_id = ?1 ORDER BY id LIMIT 1",
        )?;

        let mut rows = stmt.query_map(params![video_id], |row| {
            let word_count: i64 = row.get("word_count")?;
            let transcribed_at: String = row.get("transcribed_at")?;
            Ok(Transcript {
                id: row.get("id")?,
                video_id: row.get("video_id")?,
                raw_transcript: row.get("raw_transcript")?,
                transcript_format: row.get("transcript_format")?,
                word_count: word_count as usize,
                language: row.get("language")?,
                transcribed_at: DateTime::parse_from_rfc3339(&transcribed_at)
                    .map(|d| d.with_timezone(&Utc))
                    .unwrap_or_default(),
            })
        })?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    async fn insert_artifact(&self, artifact: &NewArtifact) -> Result<i64> {
        let conn = self.lock()?;

        let content = serde_json::to_string(&artifact.content)?;

        conn.execute(
            r#"
            INSERT INTO artifacts
            (transcript_id, processing_type, content, model_used, tokens_used, processing_time_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                artifact.transcript_id,
                artifact.content.processing_type().to_string(),
                content,
                artifact.model_used,
                artifact.tokens_used,
                artifact.processing_time_ms as i64,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn artifacts_for_transcript(&self, transcript_id: i64) -> Result<Vec<Artifact>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, transcript_id, processing_type, content, model_used,
                    tokens_used, processing_time_ms
             FROM artifacts WHERE transcript_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![transcript_id], |row| {
            let kind: String = row.get("processing_type")?;
            let content: String = row.get("content")?;
            let time_ms: i64 = row.get("processing_time_ms")?;
            Ok((
                row.get::<_, i64>("id")?,
                row.get::<_, i64>("transcript_id")?,
                kind,
                content,
                row.get::<_, String>("model_used")?,
                row.get::<_, Option<u32>>("tokens_used")?,
                time_ms,
            ))
        })?;

        let mut artifacts = Vec::new();
        for row in rows {
            let (id, transcript_id, kind, content, model_used, tokens_used, time_ms) = row?;
            let content: ArtifactContent = serde_json::from_str(&content)?;
            let processing_type = match kind.as_str() {
                "summary" => ProcessingType::Summary,
                "chapters" => ProcessingType::Chapters,
                "keywords" => ProcessingType::Keywords,
                "insights" => ProcessingType::Insights,
                other => {
                    return Err(HenteError::Catalog(format!(
                        "Unknown processing type in catalog: {}",
                        other
                    )))
                }
            };

            artifacts.push(Artifact {
                id,
                transcript_id,
                processing_type,
                content,
                model_used,
                tokens_used,
                processing_time_ms: time_ms as u64,
            });
        }

        Ok(artifacts)
    }
}
