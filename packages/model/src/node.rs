//! # Nodes
//!
//! Immutable, structurally shared document nodes.
//!
//! ## Positions
//!
//! - Text counts one unit per `char`
//! - A leaf node counts 1
//! - Any other node counts its content size plus 2 (open and close tokens)
//! - The content of the node a position is resolved against starts at 0

use crate::error::{ModelError, ModelResult, StepError};
use crate::schema::{Attrs, MarkType, NodeType};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A mark (bold, link, ...) attached to inline content
#[derive(Clone)]
pub struct Mark {
    mark_type: MarkType,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(mark_type: MarkType, attrs: Attrs) -> Self {
        Self { mark_type, attrs }
    }

    pub fn mark_type(&self) -> &MarkType {
        &self.mark_type
    }

    pub fn name(&self) -> &str {
        self.mark_type.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Add to a rank-ordered set, replacing any mark of the same type
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut out: Vec<Mark> = set
            .iter()
            .filter(|m| m.mark_type != self.mark_type)
            .cloned()
            .collect();
        let index = out
            .iter()
            .position(|m| m.mark_type.rank() > self.mark_type.rank())
            .unwrap_or(out.len());
        out.insert(index, self.clone());
        out
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter()
            .filter(|m| m.mark_type != self.mark_type)
            .cloned()
            .collect()
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }

    pub fn find_in_set<'a>(name: &str, set: &'a [Mark]) -> Option<&'a Mark> {
        set.iter().find(|m| m.name() == name)
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("type".into(), Value::String(self.name().to_string()));
        if !self.attrs.is_empty() {
            object.insert("attrs".into(), attrs_to_json(&self.attrs));
        }
        Value::Object(object)
    }
}

impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        self.mark_type == other.mark_type && self.attrs == other.attrs
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if !self.attrs.is_empty() {
            write_attrs(f, &self.attrs)?;
        }
        Ok(())
    }
}

struct NodeData {
    node_type: NodeType,
    attrs: Attrs,
    content: Vec<Node>,
    text: Option<String>,
    marks: Vec<Mark>,
    size: usize,
}

/// A document node. Cloning shares the underlying data.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn new_branch(
        node_type: NodeType,
        attrs: Attrs,
        content: Vec<Node>,
        marks: Vec<Mark>,
    ) -> Self {
        let size = if node_type.is_leaf() {
            1
        } else {
            content_size(&content) + 2
        };

        Self(Arc::new(NodeData {
            node_type,
            attrs,
            content,
            text: None,
            marks,
            size,
        }))
    }

    pub(crate) fn new_text(node_type: NodeType, text: String, marks: Vec<Mark>) -> Self {
        let size = text.chars().count();
        Self(Arc::new(NodeData {
            node_type,
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text),
            marks,
            size,
        }))
    }

    pub fn node_type(&self) -> &NodeType {
        &self.0.node_type
    }

    pub fn type_name(&self) -> &str {
        self.0.node_type.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    /// String attribute shortcut (`id`, `url`, ...)
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    pub fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.node_type.is_leaf()
    }

    pub fn is_inline(&self) -> bool {
        self.0.node_type.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.0.node_type.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.0.node_type.is_textblock()
    }

    pub fn children(&self) -> &[Node] {
        &self.0.content
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.0.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.0.content.len()
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last()
    }

    /// Size of the node including its open/close tokens
    pub fn node_size(&self) -> usize {
        self.0.size
    }

    /// Size of the node's content
    pub fn content_size(&self) -> usize {
        if self.is_text() {
            self.0.size
        } else if self.is_leaf() {
            0
        } else {
            self.0.size - 2
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.0.text {
            Some(text) => out.push_str(text),
            None => self.0.content.iter().for_each(|c| c.collect_text(out)),
        }
    }

    pub(crate) fn with_attrs(&self, attrs: Attrs) -> Node {
        Node::new_branch(
            self.0.node_type.clone(),
            attrs,
            self.0.content.clone(),
            self.0.marks.clone(),
        )
    }

    pub(crate) fn with_content(&self, content: Vec<Node>) -> Node {
        Node::new_branch(
            self.0.node_type.clone(),
            self.0.attrs.clone(),
            content,
            self.0.marks.clone(),
        )
    }

    pub(crate) fn with_marks(&self, marks: Vec<Mark>) -> Node {
        match &self.0.text {
            Some(text) => Node::new_text(self.0.node_type.clone(), text.clone(), marks),
            None => Node::new_branch(
                self.0.node_type.clone(),
                self.0.attrs.clone(),
                self.0.content.clone(),
                marks,
            ),
        }
    }

    /// Copy of this node carrying `marks`
    pub fn mark(&self, marks: Vec<Mark>) -> Node {
        self.with_marks(marks)
    }

    pub(crate) fn with_text(&self, text: String) -> Node {
        Node::new_text(self.0.node_type.clone(), text, self.0.marks.clone())
    }

    /// Slice of a text node by char offsets
    pub(crate) fn cut_text(&self, from: usize, to: usize) -> Node {
        let text = self
            .text()
            .map(|t| t.chars().skip(from).take(to.saturating_sub(from)).collect())
            .unwrap_or_default();
        self.with_text(text)
    }

    pub fn same_markup(&self, other: &Node) -> bool {
        self.0.node_type == other.0.node_type
            && self.0.attrs == other.0.attrs
            && self.0.marks == other.0.marks
    }

    /// The node starting exactly at `pos` (relative to this node's content)
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut pos = pos;

        loop {
            let mut offset = 0;
            let mut next = None;
            for child in node.children() {
                let end = offset + child.node_size();
                if pos < end {
                    next = Some((child, offset));
                    break;
                }
                offset = end;
            }

            let (child, start) = next?;
            if start == pos {
                return Some(child);
            }
            if child.is_text() || child.is_leaf() {
                return None;
            }
            node = child;
            pos -= start + 1;
        }
    }

    /// Resolve `pos` into its ancestor chain
    pub fn resolve(&self, pos: usize) -> ModelResult<ResolvedPos> {
        if pos > self.content_size() {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.content_size(),
            });
        }

        let mut levels = Vec::new();
        let mut node = self.clone();
        let mut start = 0;

        loop {
            let rel = pos - start;
            let mut offset = 0;
            let mut index = node.child_count();
            let mut descend = None;

            for (i, child) in node.children().iter().enumerate() {
                let end = offset + child.node_size();
                if rel < end {
                    index = i;
                    if rel > offset && !child.is_text() && !child.is_leaf() {
                        descend = Some((child.clone(), start + offset + 1));
                    }
                    break;
                }
                offset = end;
            }

            levels.push(Level {
                node: node.clone(),
                start,
                index,
            });

            match descend {
                Some((child, child_start)) => {
                    node = child;
                    start = child_start;
                }
                None => break,
            }
        }

        Ok(ResolvedPos { pos, levels })
    }

    /// Visit every descendant with its position; return `false` to skip a subtree
    pub fn descendants(&self, mut f: impl FnMut(&Node, usize) -> bool) {
        self.descendants_inner(0, &mut f);
    }

    fn descendants_inner(&self, start: usize, f: &mut dyn FnMut(&Node, usize) -> bool) {
        let mut pos = start;
        for child in self.children() {
            if f(child, pos) && child.child_count() > 0 {
                child.descendants_inner(pos + 1, f);
            }
            pos += child.node_size();
        }
    }

    /// Visit nodes overlapping `from..to`
    pub fn nodes_between(&self, from: usize, to: usize, mut f: impl FnMut(&Node, usize) -> bool) {
        self.nodes_between_inner(from, to, 0, &mut f);
    }

    fn nodes_between_inner(
        &self,
        from: usize,
        to: usize,
        start: usize,
        f: &mut dyn FnMut(&Node, usize) -> bool,
    ) {
        let mut pos = start;
        for child in self.children() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, pos) && child.child_count() > 0 {
                child.nodes_between_inner(from, to, pos + 1, f);
            }
            pos = end;
        }
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("type".into(), Value::String(self.type_name().to_string()));
        if !self.0.attrs.is_empty() {
            object.insert("attrs".into(), attrs_to_json(&self.0.attrs));
        }
        if let Some(text) = &self.0.text {
            object.insert("text".into(), Value::String(text.clone()));
        }
        if !self.0.content.is_empty() {
            object.insert(
                "content".into(),
                Value::Array(self.0.content.iter().map(Node::to_json).collect()),
            );
        }
        if !self.0.marks.is_empty() {
            object.insert(
                "marks".into(),
                Value::Array(self.0.marks.iter().map(Mark::to_json).collect()),
            );
        }
        Value::Object(object)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.node_type == other.0.node_type
                && self.0.attrs == other.0.attrs
                && self.0.text == other.0.text
                && self.0.marks == other.0.marks
                && self.0.content == other.0.content)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Compact form: `doc(heading[level=1]("Title"), paragraph("a ", italic("b")))`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.0.text {
            for mark in &self.0.marks {
                write!(f, "{:?}(", mark)?;
            }
            write!(f, "{:?}", text)?;
            for _ in &self.0.marks {
                f.write_str(")")?;
            }
            return Ok(());
        }

        f.write_str(self.type_name())?;
        if !self.0.attrs.is_empty() {
            write_attrs(f, &self.0.attrs)?;
        }
        if !self.is_leaf() {
            f.write_str("(")?;
            for (i, child) in self.children().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", child)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn attrs_to_json(attrs: &Attrs) -> Value {
    Value::Object(attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn write_attrs(f: &mut fmt::Formatter<'_>, attrs: &Attrs) -> fmt::Result {
    f.write_str("[")?;
    for (i, (key, value)) in attrs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}={}", key, value)?;
    }
    f.write_str("]")
}

/// A node together with its absolute position
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWithPos {
    pub node: Node,
    pub pos: usize,
}

/// Collect the children (or all descendants) of `node` accepted by `predicate`.
///
/// Positions are relative to `node`'s content, so calling this on the
/// document yields document positions.
pub fn find_children(
    node: &Node,
    predicate: impl Fn(&Node) -> bool,
    descend: bool,
) -> Vec<NodeWithPos> {
    let mut found = Vec::new();
    node.descendants(|child, pos| {
        if predicate(child) {
            found.push(NodeWithPos {
                node: child.clone(),
                pos,
            });
        }
        descend
    });
    found
}

#[derive(Debug, Clone)]
struct Level {
    node: Node,
    start: usize,
    index: usize,
}

/// A position with its ancestor chain.
///
/// Depth 0 is the node the position was resolved in; the deepest level is
/// the innermost node whose content holds the position.
#[derive(Debug, Clone)]
pub struct ResolvedPos {
    pos: usize,
    levels: Vec<Level>,
}

impl ResolvedPos {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn parent(&self) -> &Node {
        &self.levels[self.depth()].node
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.levels[depth].node
    }

    /// Start of the content of the ancestor at `depth`
    pub fn start(&self, depth: usize) -> usize {
        self.levels[depth].start
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the ancestor at `depth` (`depth >= 1`)
    pub fn before(&self, depth: usize) -> usize {
        self.start(depth) - 1
    }

    /// Position directly after the ancestor at `depth` (`depth >= 1`)
    pub fn after(&self, depth: usize) -> usize {
        self.end(depth) + 1
    }

    /// Index into the ancestor's children at `depth`
    pub fn index(&self, depth: usize) -> usize {
        self.levels[depth].index
    }

    pub fn parent_offset(&self) -> usize {
        self.pos - self.start(self.depth())
    }

    /// Offset into the text node the position falls inside, 0 at boundaries
    pub fn text_offset(&self) -> usize {
        let parent = self.parent();
        let index = self.index(self.depth());
        let before: usize = parent.children()[..index].iter().map(Node::node_size).sum();
        self.parent_offset() - before
    }

    pub fn node_after(&self) -> Option<&Node> {
        let parent = self.parent();
        parent.child(self.index(self.depth()))
    }

    pub fn node_before(&self) -> Option<&Node> {
        let index = self.index(self.depth());
        if self.text_offset() > 0 {
            return self.parent().child(index);
        }
        index.checked_sub(1).and_then(|i| self.parent().child(i))
    }

    /// Marks active at this position, taken from the text before it
    pub fn marks(&self) -> Vec<Mark> {
        self.node_before()
            .or_else(|| self.node_after())
            .filter(|n| n.is_text())
            .map(|n| n.marks().to_vec())
            .unwrap_or_default()
    }
}

pub(crate) fn content_size(children: &[Node]) -> usize {
    children.iter().map(Node::node_size).sum()
}

/// Drop empty text nodes and merge adjacent text nodes with equal marks
pub(crate) fn normalize(children: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        if let Some(text) = child.text() {
            if text.is_empty() {
                continue;
            }
            if let Some(last) = out.last_mut() {
                if let Some(prev) = last.text() {
                    if last.marks() == child.marks() {
                        let merged = format!("{}{}", prev, text);
                        *last = last.with_text(merged);
                        continue;
                    }
                }
            }
        }
        out.push(child);
    }
    out
}

/// Children overlapping `from..to` (content offsets), splitting text at the edges
pub(crate) fn cut_children(children: &[Node], from: usize, to: usize) -> Result<Vec<Node>, StepError> {
    let mut out = Vec::new();
    let mut offset = 0;

    for child in children {
        let size = child.node_size();
        let end = offset + size;
        if end <= from || offset >= to {
            offset = end;
            continue;
        }

        if from <= offset && end <= to {
            out.push(child.clone());
        } else if child.is_text() {
            let start = from.saturating_sub(offset);
            let stop = (to - offset).min(size);
            out.push(child.cut_text(start, stop));
        } else {
            return Err(StepError::CrossesNodeBoundary { from, to });
        }
        offset = end;
    }

    Ok(out)
}
