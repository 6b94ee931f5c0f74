//! # Undo/Redo History
//!
//! Tracks document snapshots and enables undo/redo.
//!
//! ## Design
//!
//! - Each recorded transaction stores the document and selection it replaced
//! - Undo restores the most recent snapshot and moves the current one to redo
//! - Redo restores the snapshot undo set aside
//! - New recorded transactions clear the redo stack
//! - Batches fold several transactions into one undo step
//! - Attribute updates made outside history (upload results) are carried
//!   into every stored snapshot holding the same identified node
//!
//! Snapshots share structure with the live document, so an entry costs one
//! `Arc` clone per recorded transaction.

use crate::node::Node;
use crate::schema::Attrs;
use crate::transaction::Selection;
use crate::transform::Step;

/// Default maximum number of undo levels
pub const DEFAULT_MAX_LEVELS: usize = 100;

/// One undo step
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Document before the step
    pub doc: Node,

    /// Selection before the step
    pub selection: Selection,

    /// Optional description of this step
    pub description: Option<String>,
}

impl HistoryEntry {
    pub fn new(doc: Node, selection: Selection) -> Self {
        Self {
            doc,
            selection,
            description: None,
        }
    }

    /// Add a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Attributes an untracked transaction gave to a node carrying an `id`
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedAttrs {
    pub node_type: String,
    pub id: String,
    pub attrs: Attrs,
}

#[derive(Debug, Clone)]
pub struct History {
    /// Undo snapshots (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Redo snapshots (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Set while a batch is open and its first entry has been recorded
    batch_recorded: Option<bool>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a history with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_MAX_LEVELS)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            batch_recorded: None,
        }
    }

    /// Record the state a transaction replaced
    pub fn record(&mut self, entry: HistoryEntry) {
        match self.batch_recorded {
            // later transactions of an open batch fold into its first entry
            Some(true) => {
                if let (Some(description), Some(top)) =
                    (entry.description, self.undo_stack.last_mut())
                {
                    top.description.get_or_insert(description);
                }
                self.redo_stack.clear();
            }
            Some(false) => {
                self.batch_recorded = Some(true);
                self.push_entry(entry);
            }
            None => self.push_entry(entry),
        }
    }

    /// Start a batch (recorded transactions are undone together)
    pub fn begin_batch(&mut self) {
        self.batch_recorded = Some(false);
    }

    /// End the current batch
    pub fn end_batch(&mut self) {
        self.batch_recorded = None;
    }

    pub fn in_batch(&self) -> bool {
        self.batch_recorded.is_some()
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Snapshot undo would restore
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.last()
    }

    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.redo_stack.last()
    }

    /// Pop the undo snapshot, parking `current` on the redo stack
    pub(crate) fn undone(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(HistoryEntry {
            description: entry.description.clone(),
            ..current
        });
        Some(entry)
    }

    /// Pop the redo snapshot, parking `current` on the undo stack
    pub(crate) fn redone(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(HistoryEntry {
            description: entry.description.clone(),
            ..current
        });
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Description of the step undo would revert
    pub fn last_undo_description(&self) -> Option<&str> {
        self.undo_stack.last()?.description.as_deref()
    }

    /// Apply `updates` to the matching node in every undo and redo snapshot.
    /// Snapshots without that node are left alone.
    pub fn carry_attrs(&mut self, updates: &[IdentifiedAttrs]) {
        if updates.is_empty() {
            return;
        }
        for entry in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            for update in updates {
                if let Some(doc) = patch_identified(&entry.doc, update) {
                    entry.doc = doc;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_recorded = None;
    }
}

fn patch_identified(doc: &Node, update: &IdentifiedAttrs) -> Option<Node> {
    let mut target = None;
    doc.descendants(|node, pos| {
        if target.is_some() {
            return false;
        }
        if node.type_name() == update.node_type && node.attr_str("id") == Some(update.id.as_str()) {
            target = Some(pos);
            return false;
        }
        true
    });

    let step = Step::SetAttrs {
        pos: target?,
        attrs: update.attrs.clone(),
    };
    step.apply(doc).ok().map(|result| result.doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::test_support::{basic_schema, doc, para};
    use serde_json::json;

    fn entry(text: &str) -> HistoryEntry {
        let schema = basic_schema();
        HistoryEntry::new(doc(&schema, vec![para(&schema, text)]), Selection::cursor(1))
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record(entry("a"));
        assert!(history.undone(entry("b")).is_some());
        assert!(history.can_redo());

        history.record(entry("c"));
        assert!(!history.can_redo());
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn test_max_levels_drops_oldest() {
        let mut history = History::with_max_levels(2);
        history.record(entry("1"));
        history.record(entry("2"));
        history.record(entry("3"));

        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.peek_undo().unwrap().doc.text_content(), "3");
        history.undone(entry("4"));
        assert_eq!(history.peek_undo().unwrap().doc.text_content(), "2");
    }

    #[test]
    fn test_batch_keeps_first_snapshot() {
        let mut history = History::new();
        history.begin_batch();
        history.record(entry("first"));
        history.record(entry("second").with_description("paste"));
        history.end_batch();

        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.peek_undo().unwrap().doc.text_content(), "first");
        assert_eq!(history.last_undo_description(), Some("paste"));
    }

    #[test]
    fn test_undo_redo_swap_entries() {
        let mut history = History::new();
        history.record(entry("old").with_description("typing"));

        let restored = history.undone(entry("new")).unwrap();
        assert_eq!(restored.doc.text_content(), "old");
        assert_eq!(history.peek_redo().unwrap().doc.text_content(), "new");

        let redone = history.redone(entry("old")).unwrap();
        assert_eq!(redone.doc.text_content(), "new");
        assert_eq!(history.last_undo_description(), Some("typing"));
        assert!(history.undone(entry("x")).is_some());
        assert!(history.undone(entry("y")).is_none());
    }

    fn image_entry(schema: &Schema, text: &str, src: &str) -> HistoryEntry {
        let mut attrs = Attrs::new();
        attrs.insert("src".into(), json!(src));
        attrs.insert("id".into(), json!("img-1"));
        let image = schema.node("image", attrs, Vec::new()).unwrap();
        let paragraph = schema
            .node("paragraph", Attrs::new(), vec![schema.text(text), image])
            .unwrap();
        HistoryEntry::new(doc(schema, vec![paragraph]), Selection::cursor(1))
    }

    #[test]
    fn test_carry_attrs_patches_every_snapshot() {
        let schema = basic_schema();
        let mut history = History::new();
        history.record(image_entry(&schema, "a", "blob:1"));
        history.record(entry("no image"));
        history.undone(image_entry(&schema, "b", "blob:1"));

        let mut attrs = Attrs::new();
        attrs.insert("src".into(), json!("https://cdn/1.png"));
        attrs.insert("id".into(), json!("img-1"));
        history.carry_attrs(&[IdentifiedAttrs {
            node_type: "image".into(),
            id: "img-1".into(),
            attrs,
        }]);

        let src = |entry: &HistoryEntry| {
            let mut found = None;
            entry.doc.descendants(|node, _| {
                if node.type_name() == "image" {
                    found = node.attr_str("src").map(str::to_string);
                }
                true
            });
            found
        };

        let redo = history.peek_redo().unwrap();
        assert_eq!(redo.doc.text_content(), "b");
        assert_eq!(src(redo).as_deref(), Some("https://cdn/1.png"));

        let oldest = history.peek_undo().unwrap();
        assert_eq!(oldest.doc.text_content(), "a");
        assert_eq!(src(oldest).as_deref(), Some("https://cdn/1.png"));
    }

    #[test]
    fn test_carry_attrs_ignores_unknown_ids() {
        let schema = basic_schema();
        let mut history = History::new();
        history.record(image_entry(&schema, "a", "blob:1"));
        let before = history.peek_undo().unwrap().clone();

        let mut attrs = Attrs::new();
        attrs.insert("src".into(), json!("x"));
        history.carry_attrs(&[IdentifiedAttrs {
            node_type: "image".into(),
            id: "other".into(),
            attrs,
        }]);
        assert_eq!(history.peek_undo(), Some(&before));
    }
}
