//! # Scribe Editor
//!
//! Extension-composed rich text editing over [`scribe_model`] trees.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ extensions: pure ExtensionBundle factories  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ manager: one schema, commands, paste rules, │
//! │          keymap (immutable, Arc-shared)     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: run / chain / paste, attachments,   │
//! │         StateChange subscriptions           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync: markdown source ⇄ rich tree           │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Composition, not registration**: an editor is exactly the bundles
//!    handed to its [`ManagerBuilder`]
//! 2. **One transaction per call**: commands, chains and paste batches each
//!    commit once or not at all
//! 3. **Identity over offsets**: anything that outlives a transaction finds
//!    its node again by identifier
//! 4. **Tagged origins**: controller writes are never mistaken for user edits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_editor::{extensions::starter_kit, CommandArgs, Editor, Manager};
//!
//! let manager = Manager::builder().extend(starter_kit()).build()?;
//! let doc = scribe_markdown::parse("# Notes", manager.schema());
//! let mut editor = Editor::new(manager, doc);
//!
//! editor.chain()
//!     .then("insert_text", CommandArgs::new().text("Draft ").position(1))
//!     .then("toggle_heading", CommandArgs::new().integer(2))
//!     .run()?;
//! ```

pub mod attachments;
mod commands;
mod config;
mod content;
mod editor;
mod errors;
mod extension;
pub mod extensions;
mod manager;
mod resolver;
mod sync;

#[cfg(test)]
mod test_support;

pub use attachments::{AsyncOutcome, AttachmentHandlers, AttachmentPhase, FileAttributes, PastedFile};
pub use commands::{ArgKind, CommandArg, CommandArgs, CommandProps, CommandSpec};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use content::{DualContent, EditorDisplay, InitialContent};
pub use editor::{Chain, Editor, PasteEvent, StateChange};
pub use errors::{CommandError, EditorError, RegistryError, UploadError};
pub use extension::{priority, ExtensionBundle, KeyBinding, PasteRule};
pub use manager::{Manager, ManagerBuilder};
pub use resolver::{locate, ID_ATTR};
pub use sync::{source_doc, DualEditor, SyncController, SyncStats};
