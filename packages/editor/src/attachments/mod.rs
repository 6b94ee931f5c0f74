//! # Attachments
//!
//! Files pasted or dropped into the document, from local preview to
//! uploaded resource.
//!
//! ## Lifecycle
//!
//! ```text
//! Pasted ──→ Uploading ──→ Resolved
//!                │
//!                └───────→ Deleted
//! ```
//!
//! - **Paste** (synchronous): every file gets a fresh identifier and a
//!   preview record; all nodes of one paste land in one transaction
//! - **Upload** (asynchronous): the handler's future is owned by the editor
//!   and driven by `Editor::settle` / `Editor::poll_async`
//! - **Resolution**: the node is found again by identifier. A miss means the
//!   node was deleted and the result is dropped
//! - Failed uploads leave the node uploading; nothing retries

mod handlers;
mod tracker;

pub use handlers::{
    AttachmentHandlers, DeleteHandler, LoggingDeleteHandler, PasteHandler, PreviewPasteHandler,
    SimulatedUploadHandler, UploadHandler,
};
pub use tracker::{AttachmentPhase, AttachmentTracker};

use crate::errors::UploadError;
use futures::future::LocalBoxFuture;
use scribe_model::{Attrs, IdGenerator, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node type holding an attachment
pub const FILE_NODE: &str = "file";

/// Transaction meta carrying the record of a deleted attachment
pub const DELETED_FILE_META: &str = "deletedFile";

/// Attributes of a `file` node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttributes {
    pub id: String,
    pub uploading: bool,
    pub url: Option<String>,
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub extra_info: Option<Value>,
}

impl FileAttributes {
    pub fn to_attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("id".into(), self.id.clone().into());
        attrs.insert("uploading".into(), self.uploading.into());
        attrs.insert("url".into(), self.url.clone().into());
        attrs.insert("name".into(), self.name.clone().into());
        attrs.insert("mimeType".into(), self.mime_type.clone().into());
        attrs.insert("sizeBytes".into(), self.size_bytes.into());
        attrs.insert(
            "extraInfo".into(),
            self.extra_info.clone().unwrap_or(Value::Null),
        );
        attrs
    }

    /// `None` when the attributes do not describe an attachment
    pub fn from_attrs(attrs: &Attrs) -> Option<Self> {
        let object = attrs.clone().into_iter().collect();
        serde_json::from_value(Value::Object(object)).ok()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_attrs().into_iter().collect())
    }
}

/// A file handed to the editor by a paste or drop
#[derive(Debug, Clone, PartialEq)]
pub struct PastedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
}

impl PastedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            bytes,
        }
    }
}

/// Result of driving one upload to completion
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncOutcome {
    /// The node was found and updated at `pos`
    Resolved { id: String, pos: usize },
    /// The node no longer exists; the result was discarded
    Dropped { id: String },
    /// The handler failed; the node stays uploading
    UploadFailed { id: String, error: UploadError },
}

impl AsyncOutcome {
    pub fn id(&self) -> &str {
        match self {
            AsyncOutcome::Resolved { id, .. }
            | AsyncOutcome::Dropped { id }
            | AsyncOutcome::UploadFailed { id, .. } => id,
        }
    }
}

pub(crate) type UploadFuture = LocalBoxFuture<'static, (String, Result<FileAttributes, UploadError>)>;

/// What a file paste rule sees while handling one paste batch
pub struct FilePasteProps<'a> {
    tr: &'a mut Transaction,
    files: &'a [PastedFile],
    pos: Option<usize>,
    ids: &'a mut IdGenerator,
    paste_handler: &'a dyn PasteHandler,
    accepted: Vec<(PastedFile, FileAttributes)>,
}

impl<'a> FilePasteProps<'a> {
    pub(crate) fn new(
        tr: &'a mut Transaction,
        files: &'a [PastedFile],
        pos: Option<usize>,
        ids: &'a mut IdGenerator,
        paste_handler: &'a dyn PasteHandler,
    ) -> Self {
        Self {
            tr,
            files,
            pos,
            ids,
            paste_handler,
            accepted: Vec::new(),
        }
    }

    pub fn tr(&mut self) -> &mut Transaction {
        &mut *self.tr
    }

    pub fn files(&self) -> &[PastedFile] {
        self.files
    }

    /// Drop position; `None` means "over the current selection"
    pub fn pos(&self) -> Option<usize> {
        self.pos
    }

    /// Build the preview record for `file` under a fresh identifier. Its
    /// upload starts once the paste transaction is committed.
    pub fn preview(&mut self, file: &PastedFile) -> FileAttributes {
        let mut attrs = self.paste_handler.preview(file);
        attrs.id = self.ids.new_id();
        attrs.uploading = true;
        self.accepted.push((file.clone(), attrs.clone()));
        attrs
    }

    pub(crate) fn into_accepted(self) -> Vec<(PastedFile, FileAttributes)> {
        self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attrs_round_trip() {
        let record = FileAttributes {
            id: "f-1".to_string(),
            uploading: true,
            url: Some("blob:a.png".to_string()),
            name: Some("a.png".to_string()),
            mime_type: Some("image/png".to_string()),
            size_bytes: Some(12),
            extra_info: Some(json!({"width": 3})),
        };

        let attrs = record.to_attrs();
        assert_eq!(attrs["mimeType"], "image/png");
        assert_eq!(attrs["sizeBytes"], 12);
        assert_eq!(FileAttributes::from_attrs(&attrs), Some(record));
    }

    #[test]
    fn test_from_attrs_requires_identifier() {
        let mut attrs = FileAttributes::default().to_attrs();
        attrs.insert("id".into(), Value::Null);
        assert_eq!(FileAttributes::from_attrs(&attrs), None);
    }
}
