//! Transcript matcher: resolves a transcript file to its catalogued video.
//!
//! Transcript artifacts are deposited by an external transcriber and named
//! `<date>_<title>_transcript.txt`, following the download output template.

use crate::catalog::{Catalog, Video};
use crate::error::Result;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Suffix identifying transcript artifacts in the watched folder.
pub const TRANSCRIPT_SUFFIX: &str = "_transcript.txt";

/// Length of the title prefix used for matching. Long enough to stay
/// specific, short enough to survive producer-side title truncation.
const FRAGMENT_LEN: usize = 20;

/// Whether a path looks like a transcript artifact.
pub fn is_transcript_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TRANSCRIPT_SUFFIX))
}

/// Resolves transcript artifact names to catalogued videos.
pub struct TranscriptMatcher {
    catalog: Arc<dyn Catalog>,
    name_pattern: Regex,
}

impl TranscriptMatcher {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        // `<date>_<title>` with the date running up to the first underscore
        let name_pattern = Regex::new(r"^(?P<date>[^_]+)_(?P<title>.+)$").expect("Invalid regex");
        Self {
            catalog,
            name_pattern,
        }
    }

    /// Extract the bounded title fragment from a transcript path.
    ///
    /// Returns None when the name does not follow the expected
    /// `<date>_<title>` convention.
    pub fn title_fragment(&self, path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_str()?;
        let stem = stem.strip_suffix("_transcript").unwrap_or(stem);

        let caps = self.name_pattern.captures(stem)?;
        let title = caps.name("title")?.as_str();

        Some(title.chars().take(FRAGMENT_LEN).collect())
    }

    /// Resolve the video a transcript artifact belongs to.
    ///
    /// Matching is a case-insensitive substring search of the title
    /// fragment against stored titles; the first hit wins, and titles
    /// sharing a 20-character prefix are not disambiguated further.
    pub async fn match_transcript(&self, path: &Path) -> Result<Option<Video>> {
        let Some(fragment) = self.title_fragment(path) else {
            debug!("Transcript name has no date/title separator: {:?}", path);
            return Ok(None);
        };

        self.catalog.find_video_by_title_fragment(&fragment).await
    }
}
