use crate::extensions::starter_kit;
use crate::{Editor, Manager};
use scribe_model::Attrs;

pub fn manager() -> Manager {
    Manager::builder().extend(starter_kit()).build().unwrap()
}

/// Editor over `doc(paragraph(text))`; the paragraph's content starts at 1
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

/// Editor over the tree parsed from `markdown`
pub fn editor_with(markdown: &str) -> Editor {
    let manager = manager();
    let doc = scribe_markdown::parse(markdown, manager.schema());
    Editor::new(manager, doc)
}
