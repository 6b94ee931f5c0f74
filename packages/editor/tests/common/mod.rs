#![allow(dead_code)]

use scribe_editor::extensions::starter_kit;
use scribe_editor::{Editor, Manager};
use scribe_model::{Attrs, Node};

pub fn manager() -> Manager {
    Manager::builder().extend(starter_kit()).build().unwrap()
}

/// Editor over `doc(paragraph(text))`
pub fn rich_editor(text: &str) -> Editor {
    let manager = manager();
    let schema = manager.schema().clone();
    let content = if text.is_empty() {
        vec![]
    } else {
        vec![schema.text(text)]
    };
    let paragraph = schema.node("paragraph", Attrs::new(), content).unwrap();
    let doc = schema.node("doc", Attrs::new(), vec![paragraph]).unwrap();
    Editor::new(manager, doc)
}

pub fn editor_with(markdown: &str) -> Editor {
    let manager = manager();
    let doc = scribe_markdown::parse(markdown, manager.schema());
    Editor::new(manager, doc)
}

/// Type names of the document's top-level blocks
pub fn block_types(doc: &Node) -> Vec<String> {
    doc.children()
        .iter()
        .map(|child| child.type_name().to_string())
        .collect()
}
