//! Configuration module for Hente.
//!
//! Handles loading and managing application settings and the derivation
//! prompt/model table.

mod prompts;
mod settings;

pub use prompts::{DerivationPrompts, TaskPrompt, TRANSCRIPT_VAR};
pub use settings::{
    CatalogSettings, ChannelSettings, DownloadSettings, GeneralSettings,
    ProcessingSettings, ScheduleSettings, Settings,
};
