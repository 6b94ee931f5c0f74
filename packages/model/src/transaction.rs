//! # Transactions
//!
//! A transaction collects steps against one state version. Each builder
//! method applies its step(s) right away, so later calls see the updated
//! document. A builder call that fails leaves the transaction untouched.

use crate::error::StepError;
use crate::node::{cut_children, Mark, Node};
use crate::schema::{Attrs, Schema};
use crate::transform::{Mapping, Step};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Meta key used by history transactions (`"undo"` / `"redo"`)
pub const HISTORY_META: &str = "history";

/// Meta key holding a human-readable description for the undo entry
pub const DESCRIPTION_META: &str = "description";

/// Who produced a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Origin {
    #[default]
    User,
    /// Written by the sync controller; never triggers a reconversion
    ControllerSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub fn range(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Cursor at the start of the first textblock
    pub fn at_start(doc: &Node) -> Self {
        let mut found = None;
        doc.descendants(|node, pos| {
            if found.is_some() {
                return false;
            }
            if node.is_textblock() {
                found = Some(pos + 1);
                return false;
            }
            true
        });
        Self::cursor(found.unwrap_or(0))
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn map(&self, mapping: &Mapping) -> Self {
        Self {
            anchor: mapping.map(self.anchor, 1),
            head: mapping.map(self.head, 1),
        }
    }

    pub fn clamp(&self, doc: &Node) -> Self {
        let size = doc.content_size();
        Self {
            anchor: self.anchor.min(size),
            head: self.head.min(size),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    schema: Schema,
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    mapping: Mapping,
    selection: Selection,
    origin: Origin,
    add_to_history: bool,
    meta: BTreeMap<String, Value>,
    base_version: u64,
}

impl Transaction {
    pub(crate) fn new(schema: Schema, doc: Node, selection: Selection, base_version: u64) -> Self {
        Self {
            schema,
            before: doc.clone(),
            doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection,
            origin: Origin::User,
            add_to_history: true,
            meta: BTreeMap::new(),
            base_version,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Document the transaction started from
    pub fn before(&self) -> &Node {
        &self.before
    }

    /// Document after all steps so far
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn add_to_history(&self) -> bool {
        self.add_to_history
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    pub fn step(&mut self, step: Step) -> Result<&mut Self, StepError> {
        let result = step.apply(&self.doc)?;
        self.selection = self.selection.map(&Mapping::from_map(result.map.clone()));
        self.mapping.append_map(result.map);
        self.doc = result.doc;
        self.steps.push(step);
        Ok(self)
    }

    pub fn replace(&mut self, from: usize, to: usize, content: Vec<Node>) -> Result<&mut Self, StepError> {
        if from == to && content.is_empty() {
            return Ok(self);
        }
        self.step(Step::replace(from, to, content))
    }

    pub fn insert(&mut self, pos: usize, content: Vec<Node>) -> Result<&mut Self, StepError> {
        self.replace(pos, pos, content)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, StepError> {
        self.replace(from, to, Vec::new())
    }

    pub fn replace_with(&mut self, from: usize, to: usize, node: Node) -> Result<&mut Self, StepError> {
        self.replace(from, to, vec![node])
    }

    /// Replace `from..to` with `node`. When `node` cannot live in the
    /// enclosing textblock, the textblock is split around it, or the node
    /// goes before or after the block when the range touches its edge.
    pub fn replace_range_with(&mut self, from: usize, to: usize, node: Node) -> Result<&mut Self, StepError> {
        let mut attempt = self.clone();
        if attempt.replace_with(from, to, node.clone()).is_ok() {
            *self = attempt;
            return Ok(self);
        }

        let mut attempt = self.clone();
        let resolved = attempt.doc.resolve(from)?;
        let depth = resolved.depth();

        // an empty textblock is swapped out entirely
        if from == to && depth > 0 && resolved.parent().content_size() == 0 {
            let (before, after) = (resolved.before(depth), resolved.after(depth));
            if attempt.replace_with(before, after, node.clone()).is_ok() {
                *self = attempt;
                return Ok(self);
            }
        }

        if from < to {
            attempt.delete(from, to)?;
        }

        let resolved = attempt.doc.resolve(from)?;
        let depth = resolved.depth();
        if depth > 0
            && resolved.parent().is_textblock()
            && from > resolved.start(depth)
            && from < resolved.end(depth)
        {
            let block = resolved.parent();
            let offset = from - resolved.start(depth);
            let head = block.with_content(cut_children(block.children(), 0, offset)?);
            let tail = block.with_content(cut_children(block.children(), offset, block.content_size())?);

            let mut candidate = attempt.clone();
            let (before, after) = (resolved.before(depth), resolved.after(depth));
            if candidate
                .replace(before, after, vec![head, node.clone(), tail])
                .is_ok()
            {
                *self = candidate;
                return Ok(self);
            }
        }

        for depth in (1..=resolved.depth()).rev() {
            let target = if from == resolved.start(depth) {
                resolved.before(depth)
            } else {
                resolved.after(depth)
            };
            let mut candidate = attempt.clone();
            if candidate.insert(target, vec![node.clone()]).is_ok() {
                *self = candidate;
                return Ok(self);
            }
        }

        Err(StepError::NoInsertionPoint(from))
    }

    /// Insert text at `pos`, inheriting the marks active there
    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<&mut Self, StepError> {
        if text.is_empty() {
            return Ok(self);
        }
        let marks = self.doc.resolve(pos)?.marks();
        let node = self.schema.text_with_marks(text, marks);
        self.insert(pos, vec![node])
    }

    /// Merge `attrs` into the attributes of the node at `pos`
    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> Result<&mut Self, StepError> {
        let node = self.doc.node_at(pos).ok_or(StepError::NoNodeAt(pos))?;
        let mut merged = node.attrs().clone();
        merged.extend(attrs);
        self.step(Step::SetAttrs { pos, attrs: merged })
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self, StepError> {
        self.step(Step::AddMark { from, to, mark })
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark_type: &str) -> Result<&mut Self, StepError> {
        self.step(Step::RemoveMark {
            from,
            to,
            mark_type: mark_type.to_string(),
        })
    }

    /// Replace the whole document content
    pub fn replace_doc_content(&mut self, content: Vec<Node>) -> Result<&mut Self, StepError> {
        let size = self.doc.content_size();
        self.step(Step::replace(0, size, content))
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection.clamp(&self.doc);
        self
    }

    pub fn set_origin(&mut self, origin: Origin) -> &mut Self {
        self.origin = origin;
        self
    }

    pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
        self.add_to_history = add;
        self
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}
