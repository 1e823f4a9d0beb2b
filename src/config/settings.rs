//! Configuration settings for Hente.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub channels: ChannelSettings,
    pub download: DownloadSettings,
    pub catalog: CatalogSettings,
    pub schedule: ScheduleSettings,
    pub processing: ProcessingSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.hente".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Tracked channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ChannelSettings {
    /// External channel identifiers to track.
    pub ids: Vec<String>,
}


/// Video discovery and download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory downloads are written to. Transcripts are expected to
    /// arrive under the same tree, so this is also the watched folder.
    pub watched_folder: String,
    /// Directory for intermediate download files.
    pub download_path: String,
    /// Maximum entries considered per channel per acquisition run.
    pub max_videos_per_run: usize,
    /// Seconds to wait after a transcript file appears before reading it.
    pub settle_delay_seconds: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            watched_folder: "~/.hente/watched".to_string(),
            download_path: "/tmp/hente/downloads".to_string(),
            max_videos_per_run: 10,
            settle_delay_seconds: 2,
        }
    }
}

/// Catalog storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Path to the SQLite catalog database.
    pub sqlite_path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.hente/catalog.db".to_string(),
        }
    }
}

/// Acquisition scheduling settings for continuous mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Hours between acquisition runs.
    pub interval_hours: u64,
    /// Seconds between scheduler wakeups.
    pub poll_seconds: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_hours: 2,
            poll_seconds: 60,
        }
    }
}

/// Transcript derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Character budget for transcript text substituted into prompts.
    pub transcript_char_limit: usize,
    /// Sampling temperature for derivation calls.
    pub temperature: f32,
    /// Maximum output tokens per derivation call.
    pub max_tokens: u32,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            transcript_char_limit: 8000,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read, so a
    /// deployment can be configured entirely through the environment.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply environment-variable overrides to the loaded settings.
    fn apply_env_overrides(&mut self) {
        if let Ok(list) = std::env::var("CHANNEL_LIST") {
            self.channels.ids = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(path) = std::env::var("DOWNLOAD_PATH") {
            self.download.download_path = path;
        }
        if let Ok(path) = std::env::var("WATCHED_FOLDER") {
            self.download.watched_folder = path;
        }
        if let Ok(max) = std::env::var("MAX_VIDEOS_PER_RUN") {
            if let Ok(max) = max.parse() {
                self.download.max_videos_per_run = max;
            }
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.general.log_level = level;
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::HenteError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hente")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded watched folder path.
    pub fn watched_folder(&self) -> PathBuf {
        Self::expand_path(&self.download.watched_folder)
    }

    /// Get the expanded download directory path.
    pub fn download_path(&self) -> PathBuf {
        Self::expand_path(&self.download.download_path)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.catalog.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.download.max_videos_per_run, 10);
        assert_eq!(settings.schedule.interval_hours, 2);
        assert_eq!(settings.processing.transcript_char_limit, 8000);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CHANNEL_LIST", "abc123, def456,");
        std::env::set_var("MAX_VIDEOS_PER_RUN", "5");

        let mut settings = Settings::default();
        settings.apply_env_overrides();

        assert_eq!(settings.channels.ids, vec!["abc123", "def456"]);
        assert_eq!(settings.download.max_videos_per_run, 5);

        std::env::remove_var("CHANNEL_LIST");
        std::env::remove_var("MAX_VIDEOS_PER_RUN");
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [channels]
            ids = ["abc123"]

            [download]
            max_videos_per_run = 3
            "#,
        )
        .unwrap();

        assert_eq!(settings.channels.ids, vec!["abc123"]);
        assert_eq!(settings.download.max_videos_per_run, 3);
        // Untouched sections keep their defaults
        assert_eq!(settings.schedule.poll_seconds, 60);
    }
}
