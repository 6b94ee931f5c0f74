//! # Steps and position maps
//!
//! A [`Step`] is the smallest document change. Applying one yields the new
//! document plus a [`StepMap`] describing how positions moved. A
//! [`Mapping`] chains step maps so a position captured before a whole
//! transaction can be carried across it.

use crate::error::StepError;
use crate::node::{cut_children, normalize, Mark, Node, ResolvedPos};
use crate::schema::Attrs;

/// Result of mapping a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The content around the position was removed
    pub deleted: bool,
}

/// Replaced ranges of one step as `(start, old_size, new_size)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
}

impl StepMap {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::identity();
        }
        Self {
            ranges: vec![(start, old_size, new_size)],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.ranges.is_empty()
    }

    /// `assoc < 0` keeps a position at a replaced range's start, otherwise
    /// it moves to the range's end
    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut diff: isize = 0;

        for &(start, old_size, new_size) in &self.ranges {
            if start > pos {
                break;
            }
            let end = start + old_size;
            if pos <= end {
                let side = if old_size == 0 {
                    assoc
                } else if pos == start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let base = start as isize + diff;
                let mapped = if side < 0 { base } else { base + new_size as isize };
                let deleted = if assoc < 0 { pos != start } else { pos != end };
                return MapResult {
                    pos: mapped.max(0) as usize,
                    deleted,
                };
            }
            diff += new_size as isize - old_size as isize;
        }

        MapResult {
            pos: (pos as isize + diff).max(0) as usize,
            deleted: false,
        }
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }
}

/// A chain of step maps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: StepMap) -> Self {
        Self { maps: vec![map] }
    }

    pub fn append_map(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn append_mapping(&mut self, other: &Mapping) {
        self.maps.extend(other.maps.iter().cloned());
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn map_result(&self, pos: usize, assoc: i8) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            deleted |= result.deleted;
            pos = result.pos;
        }
        MapResult { pos, deleted }
    }

    pub fn map(&self, pos: usize, assoc: i8) -> usize {
        self.map_result(pos, assoc).pos
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace `from..to` (same parent) with `content`
    Replace {
        from: usize,
        to: usize,
        content: Vec<Node>,
    },
    /// Replace the attributes of the node starting at `pos`
    SetAttrs { pos: usize, attrs: Attrs },
    AddMark { from: usize, to: usize, mark: Mark },
    RemoveMark {
        from: usize,
        to: usize,
        mark_type: String,
    },
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub doc: Node,
    pub map: StepMap,
}

impl Step {
    pub fn replace(from: usize, to: usize, content: Vec<Node>) -> Self {
        Step::Replace { from, to, content }
    }

    pub fn apply(&self, doc: &Node) -> Result<StepResult, StepError> {
        match self {
            Step::Replace { from, to, content } => apply_replace(doc, *from, *to, content),
            Step::SetAttrs { pos, attrs } => apply_set_attrs(doc, *pos, attrs),
            Step::AddMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                let doc = map_inline_marks(doc, 0, *from, *to, &|marks| mark.add_to_set(marks));
                Ok(StepResult {
                    doc,
                    map: StepMap::identity(),
                })
            }
            Step::RemoveMark {
                from,
                to,
                mark_type,
            } => {
                check_range(doc, *from, *to)?;
                let doc = map_inline_marks(doc, 0, *from, *to, &|marks| {
                    marks
                        .iter()
                        .filter(|m| m.name() != mark_type)
                        .cloned()
                        .collect()
                });
                Ok(StepResult {
                    doc,
                    map: StepMap::identity(),
                })
            }
        }
    }
}

fn check_range(doc: &Node, from: usize, to: usize) -> Result<(), StepError> {
    if from > to || to > doc.content_size() {
        return Err(StepError::InvalidRange { from, to });
    }
    Ok(())
}

/// Swap the innermost ancestor of `resolved` for `node` and rebuild upwards
fn rebuild(resolved: &ResolvedPos, mut node: Node) -> Node {
    for depth in (0..resolved.depth()).rev() {
        let ancestor = resolved.node(depth);
        let mut children = ancestor.children().to_vec();
        children[resolved.index(depth)] = node;
        node = ancestor.with_content(children);
    }
    node
}

fn apply_replace(doc: &Node, from: usize, to: usize, content: &[Node]) -> Result<StepResult, StepError> {
    check_range(doc, from, to)?;

    let start = doc.resolve(from)?;
    let end = doc.resolve(to)?;
    let depth = start.depth();
    if end.depth() != depth || end.start(depth) != start.start(depth) {
        return Err(StepError::CrossesNodeBoundary { from, to });
    }

    let parent = start.parent();
    let offset = start.start(depth);
    let (local_from, local_to) = (from - offset, to - offset);
    let children = parent.children();

    let mut next = cut_children(children, 0, local_from)?;
    next.extend(content.iter().cloned());
    next.extend(cut_children(children, local_to, parent.content_size())?);
    let next = normalize(next);

    if !parent.node_type().valid_content(&next) {
        return Err(crate::error::ModelError::invalid_content(
            parent.type_name(),
            format!(
                "replacing {}..{} breaks '{}'",
                from,
                to,
                parent.node_type().content_expr().as_str()
            ),
        )
        .into());
    }

    let inserted: usize = content.iter().map(Node::node_size).sum();
    Ok(StepResult {
        doc: rebuild(&start, parent.with_content(next)),
        map: StepMap::new(from, to - from, inserted),
    })
}

fn apply_set_attrs(doc: &Node, pos: usize, attrs: &Attrs) -> Result<StepResult, StepError> {
    let target = doc.node_at(pos).ok_or(StepError::NoNodeAt(pos))?;
    if target.is_text() {
        return Err(StepError::NoNodeAt(pos));
    }
    let updated = target.with_attrs(target.node_type().compute_attrs(attrs)?);

    let resolved = doc.resolve(pos)?;
    let parent = resolved.parent();
    let mut children = parent.children().to_vec();
    children[resolved.index(resolved.depth())] = updated;

    Ok(StepResult {
        doc: rebuild(&resolved, parent.with_content(children)),
        map: StepMap::identity(),
    })
}

fn map_inline_marks(
    node: &Node,
    start: usize,
    from: usize,
    to: usize,
    f: &dyn Fn(&[Mark]) -> Vec<Mark>,
) -> Node {
    if node.child_count() == 0 {
        return node.clone();
    }

    let mut children = Vec::with_capacity(node.child_count());
    let mut pos = start;
    for child in node.children() {
        let size = child.node_size();
        let end = pos + size;

        if end <= from || pos >= to || (child.is_inline() && node.node_type().is_code()) {
            children.push(child.clone());
        } else if child.is_text() {
            let cut_from = from.saturating_sub(pos);
            let cut_to = (to - pos).min(size);
            children.push(child.cut_text(0, cut_from));
            let marked = child.cut_text(cut_from, cut_to);
            children.push(marked.with_marks(f(marked.marks())));
            children.push(child.cut_text(cut_to, size));
        } else if child.is_inline() {
            children.push(child.with_marks(f(child.marks())));
        } else {
            children.push(map_inline_marks(child, pos + 1, from, to, f));
        }

        pos = end;
    }

    node.with_content(normalize(children))
}
