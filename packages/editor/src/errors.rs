//! Error types for the editor

use scribe_model::{ModelError, StepError};
use thiserror::Error;

/// Failures while composing extensions into a [`crate::Manager`]
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Conflicting declarations of '{name}': {reason}")]
    SchemaConflict { name: String, reason: String },

    #[error("Command '{0}' is registered twice")]
    CommandNameConflict(String),

    #[error("Schema error: {0}")]
    Schema(#[from] ModelError),
}

/// Programmer errors when invoking commands. A command whose preconditions
/// do not hold returns `Ok(false)` instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments for '{command}': {message}")]
    InvalidArguments { command: String, message: String },

    #[error("Failed to commit '{command}': {message}")]
    Commit { command: String, message: String },
}

impl CommandError {
    pub fn invalid_arguments(command: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Step error: {0}")]
    Step(#[from] StepError),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Reported by upload handlers. The attachment stays in its uploading state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("Upload failed: {0}")]
    Failed(String),

    #[error("Upload rejected: {0}")]
    Rejected(String),
}
