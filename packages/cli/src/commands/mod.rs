pub mod fmt;
pub mod json;

pub use fmt::{fmt, FmtArgs};
pub use json::{from_json, to_json, FromJsonArgs, ToJsonArgs};

use anyhow::{Context as _, Result};
use scribe_editor::extensions::starter_kit;
use scribe_editor::{EditorConfig, Manager};
use std::io::Read;
use std::path::Path;

/// Configuration and schema shared by every command
pub struct Context {
    pub config: EditorConfig,
    pub manager: Manager,
}

impl Context {
    /// Load `path`, or `scribe.config.json` from the working directory
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file does not exist: {}", path.display());
                }
                EditorConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?
            }
            None => {
                let cwd = std::env::current_dir().context("Cannot get current directory")?;
                EditorConfig::load_from_dir(&cwd).context("Failed to load scribe.config.json")?
            }
        };
        Self::with_config(config)
    }

    pub fn with_config(config: EditorConfig) -> Result<Self> {
        let manager = Manager::builder()
            .extend(starter_kit())
            .build()
            .context("Failed to build the editor schema")?;
        Ok(Self { config, manager })
    }
}

/// Read a file, or stdin when `path` is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read stdin")?;
        return Ok(input);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
