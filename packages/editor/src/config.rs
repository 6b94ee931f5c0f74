use crate::errors::EditorError;
use scribe_markdown::MarkdownOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "scribe.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Idle time before text-mode edits are parsed into the tree
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Undo levels kept per editor (0 = unlimited)
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Seed label for node identifiers
    #[serde(default = "default_instance_label")]
    pub instance_label: String,

    #[serde(default)]
    pub markdown: MarkdownOptions,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_history_depth() -> usize {
    scribe_model::history::DEFAULT_MAX_LEVELS
}

fn default_instance_label() -> String {
    "scribe".to_string()
}

impl EditorConfig {
    /// Load config from a file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EditorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load `scribe.config.json` from a directory
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        Self::load(dir.as_ref().join(DEFAULT_CONFIG_NAME))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            history_depth: default_history_depth(),
            instance_label: default_instance_label(),
            markdown: MarkdownOptions::default(),
        }
    }
}
