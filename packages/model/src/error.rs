use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Missing required attribute '{attr}' on {node_type}")]
    MissingAttribute { node_type: String, attr: String },

    #[error("Invalid content for {node_type}: {message}")]
    InvalidContent { node_type: String, message: String },

    #[error("Position {pos} out of range (content size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid JSON node: {0}")]
    InvalidJson(String),

    #[error("Transaction was built against version {expected}, state is at {actual}")]
    StaleTransaction { expected: u64, actual: u64 },
}

impl ModelError {
    pub fn invalid_content(node_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            node_type: node_type.into(),
            message: message.into(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson(message.into())
    }
}

/// Errors raised while applying a single step to a document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Replace {from}..{to} crosses a node boundary")]
    CrossesNodeBoundary { from: usize, to: usize },

    #[error("No node starts at position {0}")]
    NoNodeAt(usize),

    #[error("Invalid range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("No valid insertion point near {0}")]
    NoInsertionPoint(usize),
}
