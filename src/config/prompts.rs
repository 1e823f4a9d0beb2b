//! Prompt templates and model assignments for the derivation tasks.
//!
//! Each derivation task carries its own prompt template and model identifier.
//! Defaults can be overridden per task in the configuration file.

use crate::catalog::ProcessingType;
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the (truncated) transcript text.
pub const TRANSCRIPT_VAR: &str = "{{transcript}}";

/// One derivation task's prompt template and assigned model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPrompt {
    pub template: String,
    pub model: String,
}

impl Default for TaskPrompt {
    fn default() -> Self {
        Self {
            template: String::new(),
            model: "anthropic/claude-3-haiku".to_string(),
        }
    }
}

impl TaskPrompt {
    fn new(template: &str, model: &str) -> Self {
        Self {
            template: template.to_string(),
            model: model.to_string(),
        }
    }

    /// Render the prompt by substituting the transcript text.
    pub fn render(&self, transcript: &str) -> String {
        self.template.replace(TRANSCRIPT_VAR, transcript)
    }
}

/// The fixed table of derivation prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationPrompts {
    pub summary: TaskPrompt,
    pub chapters: TaskPrompt,
    pub keywords: TaskPrompt,
    pub insights: TaskPrompt,
}

impl Default for DerivationPrompts {
    fn default() -> Self {
        Self {
            summary: TaskPrompt::new(
                "Summarize this YouTube video transcript in 3-5 paragraphs. \
                 Include key points and main takeaways. Transcript: {{transcript}}",
                "anthropic/claude-3-haiku",
            ),
            chapters: TaskPrompt::new(
                "Create chapter timestamps for this video transcript. \
                 Format each line as: [HH:MM:SS] Chapter Title. Transcript: {{transcript}}",
                "openai/gpt-4-turbo",
            ),
            keywords: TaskPrompt::new(
                "Extract 10-15 important keywords/phrases from this transcript. \
                 Focus on technical terms, topics, and key concepts. \
                 Return as a comma-separated list. Transcript: {{transcript}}",
                "anthropic/claude-3-haiku",
            ),
            insights: TaskPrompt::new(
                "Analyze this transcript and provide: 1. Main topic and subtopics, \
                 2. Key insights or learnings, 3. Actionable takeaways, \
                 4. Related topics to explore. Format as JSON. Transcript: {{transcript}}",
                "anthropic/claude-3-sonnet",
            ),
        }
    }
}

impl DerivationPrompts {
    /// Load prompt overrides from `prompts.toml` next to the main config,
    /// falling back to the built-in table.
    pub fn load() -> crate::error::Result<Self> {
        let path = crate::config::Settings::default_config_path()
            .with_file_name("prompts.toml");
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// All derivation tasks, in fan-out order.
    pub fn tasks(&self) -> [(ProcessingType, &TaskPrompt); 4] {
        [
            (ProcessingType::Summary, &self.summary),
            (ProcessingType::Chapters, &self.chapters),
            (ProcessingType::Keywords, &self.keywords),
            (ProcessingType::Insights, &self.insights),
        ]
    }

    /// Look up one task's prompt by processing type.
    pub fn for_type(&self, kind: ProcessingType) -> &TaskPrompt {
        match kind {
            ProcessingType::Summary => &self.summary,
            ProcessingType::Chapters => &self.chapters,
            ProcessingType::Keywords => &self.keywords,
            ProcessingType::Insights => &self.insights,
        }
    }
}
