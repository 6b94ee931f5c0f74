//! Pluggable paste, upload and delete handlers

use super::{FileAttributes, PastedFile};
use crate::errors::UploadError;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::time::Duration;
use tracing::debug;

/// Builds the synchronous placeholder record for a pasted file. The
/// identifier is assigned by the editor afterwards.
pub trait PasteHandler {
    fn preview(&self, file: &PastedFile) -> FileAttributes;
}

/// Uploads a file and returns its resolved record
pub trait UploadHandler {
    fn upload(
        &self,
        file: &PastedFile,
        preview: &FileAttributes,
    ) -> LocalBoxFuture<'static, Result<FileAttributes, UploadError>>;
}

/// Notified after an attachment node is deleted. Best effort, not awaited.
pub trait DeleteHandler {
    fn deleted(&self, record: &FileAttributes);
}

/// Records name, type and size with a `blob:` preview URL
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewPasteHandler;

impl PasteHandler for PreviewPasteHandler {
    fn preview(&self, file: &PastedFile) -> FileAttributes {
        FileAttributes {
            id: String::new(),
            uploading: true,
            url: Some(format!("blob:{}", file.name)),
            name: Some(file.name.clone()),
            mime_type: Some(file.mime_type.clone()),
            size_bytes: Some(file.size_bytes),
            extra_info: None,
        }
    }
}

/// Waits on a tokio timer, then reports the file as uploaded
#[derive(Debug, Clone)]
pub struct SimulatedUploadHandler {
    pub delay: Duration,
    pub base_url: String,
}

impl Default for SimulatedUploadHandler {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
            base_url: "https://files.scribe.local".to_string(),
        }
    }
}

impl UploadHandler for SimulatedUploadHandler {
    fn upload(
        &self,
        file: &PastedFile,
        preview: &FileAttributes,
    ) -> LocalBoxFuture<'static, Result<FileAttributes, UploadError>> {
        let delay = self.delay;
        let resolved = FileAttributes {
            uploading: false,
            url: Some(format!("{}/{}", self.base_url, file.name)),
            ..preview.clone()
        };
        async move {
            tokio::time::sleep(delay).await;
            Ok(resolved)
        }
        .boxed_local()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDeleteHandler;

impl DeleteHandler for LoggingDeleteHandler {
    fn deleted(&self, record: &FileAttributes) {
        debug!(id = %record.id, name = ?record.name, "attachment deleted");
    }
}

/// The three handlers an editor uses for attachments
pub struct AttachmentHandlers {
    pub paste: Box<dyn PasteHandler>,
    pub upload: Box<dyn UploadHandler>,
    pub delete: Box<dyn DeleteHandler>,
}

impl AttachmentHandlers {
    pub fn with_paste(mut self, handler: impl PasteHandler + 'static) -> Self {
        self.paste = Box::new(handler);
        self
    }

    pub fn with_upload(mut self, handler: impl UploadHandler + 'static) -> Self {
        self.upload = Box::new(handler);
        self
    }

    pub fn with_delete(mut self, handler: impl DeleteHandler + 'static) -> Self {
        self.delete = Box::new(handler);
        self
    }
}

impl Default for AttachmentHandlers {
    fn default() -> Self {
        Self {
            paste: Box::new(PreviewPasteHandler),
            upload: Box::new(SimulatedUploadHandler::default()),
            delete: Box::new(LoggingDeleteHandler),
        }
    }
}

impl std::fmt::Debug for AttachmentHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentHandlers").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_upload_resolves_after_delay() {
        let file = PastedFile::new("a.txt", "text/plain", b"hello".to_vec());
        let preview = PreviewPasteHandler.preview(&file);
        assert_eq!(preview.url.as_deref(), Some("blob:a.txt"));
        assert_eq!(preview.size_bytes, Some(5));

        let start = tokio::time::Instant::now();
        let resolved = SimulatedUploadHandler::default()
            .upload(&file, &preview)
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(!resolved.uploading);
        assert_eq!(resolved.url.as_deref(), Some("https://files.scribe.local/a.txt"));
        assert_eq!(resolved.name.as_deref(), Some("a.txt"));
    }
}
