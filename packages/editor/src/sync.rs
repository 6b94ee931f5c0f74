//! # Dual-representation sync
//!
//! Keeps a markdown source editor and a rich tree editor showing the same
//! document.
//!
//! ```text
//!   tree editor ──(User change)──→ serialize ──→ text editor   (immediately)
//!   text editor ──(User change)──→ arm deadline
//!                                      ↓ debounce elapsed
//!                                  parse latest text ──→ tree editor
//! ```
//!
//! ## Design
//!
//! - Both editors publish [`StateChange`]s on their own channel; the
//!   controller drains them in [`DualEditor::pump`]
//! - Updates written by the controller carry [`Origin::ControllerSync`] and
//!   are never converted back
//! - The debounce is a `tokio::time` deadline counted from the commit time
//!   of the latest text edit, fired by [`DualEditor::poll`] or awaited by
//!   [`DualEditor::settle`]

use crate::config::EditorConfig;
use crate::content::{DualContent, EditorDisplay, InitialContent};
use crate::editor::{Editor, StateChange};
use crate::errors::EditorError;
use crate::extensions::{markdown_source, starter_kit, MARKDOWN_LANGUAGE};
use crate::manager::Manager;
use crate::CommandArgs;
use scribe_markdown::{parse, serialize_with, MarkdownOptions};
use scribe_model::transaction::DESCRIPTION_META;
use scribe_model::{Attrs, History, IdGenerator, Node, Origin, Schema};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;
use tracing::{debug, info};

const SYNC_DESCRIPTION: &str = "sync";

/// Conversions performed in each direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub text_to_tree: usize,
    pub tree_to_text: usize,
}

/// Debounce bookkeeping for text-mode edits
#[derive(Debug, Clone)]
pub struct SyncController {
    debounce: Duration,
    deadline: Option<Instant>,
}

impl SyncController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// (Re-)start the idle period at `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the deadline whether or not it has passed
    pub fn take_pending(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// A text-mode editor and a tree-mode editor kept in sync
pub struct DualEditor {
    text: Editor,
    tree: Editor,
    text_changes: UnboundedReceiver<StateChange>,
    tree_changes: UnboundedReceiver<StateChange>,
    controller: SyncController,
    display: EditorDisplay,
    options: MarkdownOptions,
    stats: SyncStats,
}

impl DualEditor {
    /// Build both editors with the built-in extension sets
    pub fn new(initial: InitialContent, config: &EditorConfig) -> Result<Self, EditorError> {
        let text_manager = Manager::builder().extend(markdown_source()).build()?;
        let tree_manager = Manager::builder().extend(starter_kit()).build()?;
        Self::with_managers(text_manager, tree_manager, initial, config)
    }

    /// `text_manager` must provide a code block that holds plain text
    pub fn with_managers(
        text_manager: Manager,
        tree_manager: Manager,
        initial: InitialContent,
        config: &EditorConfig,
    ) -> Result<Self, EditorError> {
        let content = DualContent::from_initial(initial, tree_manager.schema(), &config.markdown)?;
        let text_doc = source_doc(text_manager.schema(), &content.text)?;

        let mut text = Editor::with_history(
            text_manager,
            text_doc,
            History::with_max_levels(config.history_depth),
        )
        .with_ids(IdGenerator::new(&format!("{}-text", config.instance_label)));
        let mut tree = Editor::with_history(
            tree_manager,
            content.tree,
            History::with_max_levels(config.history_depth),
        )
        .with_ids(IdGenerator::new(&config.instance_label));

        let text_changes = text.subscribe();
        let tree_changes = tree.subscribe();

        info!(
            label = %config.instance_label,
            debounce_ms = config.debounce_ms,
            "dual editor ready"
        );

        Ok(Self {
            text,
            tree,
            text_changes,
            tree_changes,
            controller: SyncController::new(config.debounce()),
            display: EditorDisplay::default(),
            options: config.markdown.clone(),
            stats: SyncStats::default(),
        })
    }

    pub fn text_editor(&self) -> &Editor {
        &self.text
    }

    /// Edits made here are picked up by the next `pump`, `poll`, `flush`
    /// or `settle`
    pub fn text_editor_mut(&mut self) -> &mut Editor {
        &mut self.text
    }

    pub fn tree_editor(&self) -> &Editor {
        &self.tree
    }

    pub fn tree_editor_mut(&mut self) -> &mut Editor {
        &mut self.tree
    }

    /// Current markdown source
    pub fn text(&self) -> String {
        self.text.doc().text_content()
    }

    pub fn tree(&self) -> &Node {
        self.tree.doc()
    }

    pub fn content(&self) -> DualContent {
        DualContent {
            text: self.text(),
            tree: self.tree.doc().clone(),
        }
    }

    pub fn display(&self) -> EditorDisplay {
        self.display
    }

    /// Switch the focused view. Nothing is converted.
    pub fn set_display(&mut self, display: EditorDisplay) {
        let mode = display;
        debug!(?mode, "display switched");
        self.display = display;
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn controller(&self) -> &SyncController {
        &self.controller
    }

    /// Run a command in the tree editor and sync the result
    pub fn run_tree(&mut self, name: &str, args: &CommandArgs) -> Result<bool, EditorError> {
        let applied = self.tree.run(name, args)?;
        self.pump()?;
        Ok(applied)
    }

    /// Run a command in the text editor and arm the debounce
    pub fn run_text(&mut self, name: &str, args: &CommandArgs) -> Result<bool, EditorError> {
        let applied = self.text.run(name, args)?;
        self.pump()?;
        Ok(applied)
    }

    /// Replace the whole markdown source as a user edit
    pub fn replace_text(&mut self, text: &str) -> Result<(), EditorError> {
        let doc = source_doc(self.text.schema(), text)?;
        let mut tr = self.text.state().tr();
        tr.replace_doc_content(doc.children().to_vec())?;
        self.text.dispatch(tr)?;
        self.pump()
    }

    /// Drain both change channels. Tree changes are written to the text
    /// editor at once; text changes re-arm the debounce.
    pub fn pump(&mut self) -> Result<(), EditorError> {
        let mut tree_dirty = false;
        while let Ok(change) = self.tree_changes.try_recv() {
            if change.doc_changed && change.origin == Origin::User {
                tree_dirty = true;
            }
        }
        if tree_dirty {
            self.sync_tree_to_text()?;
        }

        while let Ok(change) = self.text_changes.try_recv() {
            if change.doc_changed && change.origin == Origin::User {
                debug!(version = change.version, "text edited, debounce re-armed");
                self.controller.arm(change.at);
            }
        }
        Ok(())
    }

    /// Fire the text-to-tree sync if the idle period has elapsed by `now`
    pub fn poll(&mut self, now: Instant) -> Result<bool, EditorError> {
        self.pump()?;
        if !self.controller.take_due(now) {
            return Ok(false);
        }
        self.sync_text_to_tree()?;
        Ok(true)
    }

    /// Sync pending text edits right away
    pub fn flush(&mut self) -> Result<bool, EditorError> {
        self.pump()?;
        if !self.controller.take_pending() {
            return Ok(false);
        }
        self.sync_text_to_tree()?;
        Ok(true)
    }

    /// Wait until uploads have finished and no sync is pending
    pub async fn settle(&mut self) -> Result<(), EditorError> {
        loop {
            self.pump()?;
            if self.tree.pending_uploads() > 0 {
                self.tree.settle().await;
                continue;
            }
            match self.controller.deadline() {
                Some(deadline) => {
                    tokio::time::sleep_until(deadline).await;
                    self.poll(Instant::now())?;
                }
                None => return Ok(()),
            }
        }
    }

    fn sync_tree_to_text(&mut self) -> Result<(), EditorError> {
        let text = serialize_with(self.tree.doc(), &self.options);
        self.stats.tree_to_text += 1;
        if text == self.text() {
            return Ok(());
        }

        let doc = source_doc(self.text.schema(), &text)?;
        let mut tr = self.text.state().tr();
        tr.replace_doc_content(doc.children().to_vec())?;
        tr.set_origin(Origin::ControllerSync);
        tr.set_meta(DESCRIPTION_META, SYNC_DESCRIPTION);
        self.text.dispatch(tr)?;

        // a user edit still waiting in the text editor was just overwritten
        self.controller.take_pending();
        debug!(chars = text.chars().count(), "tree synced to text");
        Ok(())
    }

    fn sync_text_to_tree(&mut self) -> Result<(), EditorError> {
        let parsed = parse(&self.text(), self.tree.schema());
        self.stats.text_to_tree += 1;
        if &parsed == self.tree.doc() {
            return Ok(());
        }

        let mut tr = self.tree.state().tr();
        tr.replace_doc_content(parsed.children().to_vec())?;
        tr.set_origin(Origin::ControllerSync);
        tr.set_meta(DESCRIPTION_META, SYNC_DESCRIPTION);
        self.tree.dispatch(tr)?;
        debug!(blocks = parsed.child_count(), "text synced to tree");
        Ok(())
    }
}

impl std::fmt::Debug for DualEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualEditor")
            .field("display", &self.display)
            .field("stats", &self.stats)
            .field("pending", &self.controller.is_pending())
            .finish_non_exhaustive()
    }
}

/// Source document: one markdown code block holding `text`
pub fn source_doc(schema: &Schema, text: &str) -> Result<Node, EditorError> {
    let mut attrs = Attrs::new();
    attrs.insert("language".into(), json!(MARKDOWN_LANGUAGE));
    let content = if text.is_empty() {
        Vec::new()
    } else {
        vec![schema.text(text)]
    };

    let block = schema.node("code_block", attrs, content)?;
    Ok(schema.node(schema.top_node_type().name(), Attrs::new(), vec![block])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_rearm() {
        let start = Instant::now();
        let mut controller = SyncController::new(Duration::from_millis(500));
        assert!(!controller.take_due(start));

        controller.arm(start);
        controller.arm(start + Duration::from_millis(300));
        assert!(!controller.take_due(start + Duration::from_millis(500)));
        assert!(controller.take_due(start + Duration::from_millis(800)));
        assert!(!controller.is_pending());
    }

    #[test]
    fn test_initial_text_fills_both_sides() {
        let dual = DualEditor::new(
            InitialContent::Text("# Title\n\nSome *text*.".to_string()),
            &EditorConfig::default(),
        )
        .unwrap();

        assert_eq!(dual.text(), "# Title\n\nSome *text*.");
        assert_eq!(dual.tree().child_count(), 2);
        assert_eq!(dual.stats(), SyncStats::default());
    }

    #[test]
    fn test_display_switch_converts_nothing() {
        let mut dual =
            DualEditor::new(InitialContent::Text("a".to_string()), &EditorConfig::default()).unwrap();
        dual.set_display(EditorDisplay::Markdown);

        assert_eq!(dual.display(), EditorDisplay::Markdown);
        dual.pump().unwrap();
        assert_eq!(dual.stats(), SyncStats::default());
    }
}
