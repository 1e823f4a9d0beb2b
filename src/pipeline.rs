//! Artifact pipeline: stores a transcript and fans it out to the
//! derivation tasks.
//!
//! Each derivation task is an independent failure domain: one task's
//! error is logged and the remaining tasks still run and persist their
//! artifacts.

use crate::catalog::{ArtifactContent, Catalog, NewArtifact, NewTranscript, ProcessingType};
use crate::config::{DerivationPrompts, ProcessingSettings};
use crate::error::Result;
use crate::inference::Inference;
use crate::matcher::TranscriptMatcher;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Outcome of one transcript ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Transcript stored; carries the transcript's internal primary key.
    Ingested(i64),
    /// No catalogued video matched the artifact name.
    Unmatched,
}

/// Ingests transcript artifacts and derives structured content from them.
pub struct ArtifactPipeline {
    catalog: Arc<dyn Catalog>,
    inference: Arc<dyn Inference>,
    matcher: TranscriptMatcher,
    prompts: DerivationPrompts,
    processing: ProcessingSettings,
}

impl ArtifactPipeline {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        inference: Arc<dyn Inference>,
        prompts: DerivationPrompts,
        processing: ProcessingSettings,
    ) -> Self {
        let matcher = TranscriptMatcher::new(catalog.clone());
        Self {
            catalog,
            inference,
            matcher,
            prompts,
            processing,
        }
    }

    /// Ingest one transcript artifact: store the raw transcript, then run
    /// every derivation task against it.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest(&self, path: &Path) -> Result<IngestOutcome> {
        let transcript_text = tokio::fs::read_to_string(path).await?;

        let Some(video) = self.matcher.match_transcript(path).await? else {
            warn!("Could not find video for transcript: {:?}", path);
            return Ok(IngestOutcome::Unmatched);
        };

        let word_count = transcript_text.split_whitespace().count();
        let transcript_id = self
            .catalog
            .insert_transcript(&NewTranscript {
                video_id: video.id,
                raw_transcript: transcript_text.clone(),
                transcript_format: "txt".to_string(),
                word_count,
                language: "en".to_string(),
                transcribed_at: Utc::now(),
            })
            .await?;

        info!("Saved transcript for video: {}", video.title);

        self.derive_all(transcript_id, &transcript_text).await;

        Ok(IngestOutcome::Ingested(transcript_id))
    }

    /// Run every derivation task against a stored transcript.
    ///
    /// Task failures are logged and do not affect the other tasks.
    pub async fn derive_all(&self, transcript_id: i64, transcript_text: &str) {
        let truncated = truncate_chars(transcript_text, self.processing.transcript_char_limit);

        for (kind, task) in self.prompts.tasks() {
            if let Err(e) = self
                .derive_one(transcript_id, kind, task.render(truncated), &task.model)
                .await
            {
                error!("Error in {} processing: {}", kind, e);
            } else {
                info!("Completed {} processing for transcript {}", kind, transcript_id);
            }
        }
    }

    async fn derive_one(
        &self,
        transcript_id: i64,
        kind: ProcessingType,
        prompt: String,
        model: &str,
    ) -> Result<()> {
        let started = Instant::now();

        let completion = self
            .inference
            .complete(
                model,
                &prompt,
                self.processing.temperature,
                self.processing.max_tokens,
            )
            .await?;

        let content = parse_content(kind, &completion.text);

        self.catalog
            .insert_artifact(&NewArtifact {
                transcript_id,
                content,
                model_used: model.to_string(),
                tokens_used: completion.total_tokens,
                processing_time_ms: started.elapsed().as_millis() as u64,
            })
            .await?;

        Ok(())
    }
}

/// Parse a model response into structured content for its task type.
///
/// Structured parses degrade to wrapping the raw text instead of failing.
fn parse_content(kind: ProcessingType, text: &str) -> ArtifactContent {
    match kind {
        ProcessingType::Summary => ArtifactContent::Summary {
            content: text.to_string(),
        },
        ProcessingType::Chapters => ArtifactContent::Chapters {
            content: text.to_string(),
        },
        ProcessingType::Keywords => ArtifactContent::Keywords {
            keywords: text
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        },
        ProcessingType::Insights => {
            let data = serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::json!({ "raw": text }));
            ArtifactContent::Insights { data }
        }
    }
}

/// Truncate to a character budget without splitting a code point.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
