//! # Built-in Extensions
//!
//! Factory functions returning [`ExtensionBundle`] values. Each is pure and
//! can be called any number of times.
//!
//! ```text
//! starter_kit()      document, paragraph, text, headings, quotes, code,
//!                    lists, rules, breaks, images, marks, history, files
//! markdown_source()  the text-mode editor: one markdown code block
//! ```

pub mod base;
pub mod blocks;
pub mod file;
pub mod history;
pub mod marks;

use crate::extension::ExtensionBundle;
use scribe_model::{Node, Selection};

/// Language attribute of the text-mode code block
pub const MARKDOWN_LANGUAGE: &str = "markdown";

/// Every built-in extension for the rich tree editor
pub fn starter_kit() -> Vec<ExtensionBundle> {
    vec![
        base::document("block+"),
        base::paragraph(),
        base::text(),
        base::commands(),
        blocks::heading(),
        blocks::blockquote(),
        blocks::code_block(),
        blocks::lists(),
        blocks::horizontal_rule(),
        blocks::hard_break(),
        blocks::image(),
        marks::bold(),
        marks::italic(),
        marks::code(),
        marks::link(),
        history::history(),
        file::file(),
    ]
}

/// Extensions of the text-mode editor: a document holding exactly one code
/// block with the markdown source
pub fn markdown_source() -> Vec<ExtensionBundle> {
    vec![
        base::document("code_block"),
        base::text(),
        base::commands(),
        blocks::code_block(),
        history::history(),
    ]
}

/// Innermost textblock holding `pos`, with the position directly before it
pub(crate) fn textblock_at(doc: &Node, pos: usize) -> Option<(usize, usize, Node)> {
    let resolved = doc.resolve(pos).ok()?;
    let depth = resolved.depth();
    if depth == 0 || !resolved.parent().is_textblock() {
        return None;
    }
    Some((depth, resolved.before(depth), resolved.parent().clone()))
}

/// Range a command without an explicit position acts on
pub(crate) fn selection_range(selection: Selection, pos: Option<usize>) -> (usize, usize) {
    match pos {
        Some(pos) => (pos, pos),
        None => (selection.from(), selection.to()),
    }
}
