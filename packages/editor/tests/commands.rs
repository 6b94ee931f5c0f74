mod common;

use common::{block_types, editor_with, rich_editor};
use scribe_editor::{locate, CommandArgs, CommandError};
use scribe_model::Attrs;
use serde_json::json;

#[test]
fn test_chain_commits_once() {
    let mut editor = rich_editor("title");
    let version = editor.state().version();

    let committed = editor
        .chain()
        .then("insert_text", CommandArgs::new().text("A ").position(1))
        .then("toggle_heading", CommandArgs::new().integer(2))
        .run()
        .unwrap();

    assert!(committed);
    assert_eq!(editor.state().version(), version + 1);
    assert_eq!(editor.doc().to_string(), r#"doc(heading[level=2]("A title"))"#);

    // one undo step for the whole chain
    assert!(editor.run("undo", &CommandArgs::new()).unwrap());
    assert_eq!(editor.doc().to_string(), r#"doc(paragraph("title"))"#);
}

#[test]
fn test_failed_step_discards_the_whole_chain() {
    let mut editor = rich_editor("abc");
    let before = editor.doc().clone();
    let version = editor.state().version();

    let committed = editor
        .chain()
        .then("insert_text", CommandArgs::new().text("X").position(1))
        .then("toggle_heading", CommandArgs::new().integer(9))
        .then("insert_text", CommandArgs::new().text("Y").position(1))
        .run()
        .unwrap();

    assert!(!committed);
    assert_eq!(editor.doc(), &before);
    assert_eq!(editor.state().version(), version);
}

#[test]
fn test_chain_reports_unknown_commands_before_running() {
    let mut editor = rich_editor("abc");
    let result = editor
        .chain()
        .then("insert_text", CommandArgs::new().text("X"))
        .then("does_not_exist", CommandArgs::new())
        .run();

    assert_eq!(result, Err(CommandError::UnknownCommand("does_not_exist".to_string())));
    assert_eq!(editor.doc().text_content(), "abc");
}

#[test]
fn test_can_reflects_preconditions() {
    let editor = editor_with("# Title\n\n---");

    assert!(editor.can("toggle_heading", &CommandArgs::new().integer(1)).unwrap());
    assert!(!editor.can("toggle_heading", &CommandArgs::new().integer(7)).unwrap());
    assert!(!editor.can("delete_file", &CommandArgs::new().position(0)).unwrap());
}

#[test]
fn test_list_toggles() {
    let mut editor = rich_editor("item");

    assert!(editor.run("toggle_bullet_list", &CommandArgs::new()).unwrap());
    assert_eq!(block_types(editor.doc()), vec!["bullet_list"]);

    assert!(editor.run("toggle_ordered_list", &CommandArgs::new()).unwrap());
    assert_eq!(block_types(editor.doc()), vec!["ordered_list"]);

    assert!(editor.run("toggle_ordered_list", &CommandArgs::new()).unwrap());
    assert_eq!(block_types(editor.doc()), vec!["paragraph"]);
    assert_eq!(editor.doc().text_content(), "item");
}

#[test]
fn test_identifiers_survive_unrelated_edits() {
    let mut editor = editor_with("first\n\nsecond");

    let mut attrs = Attrs::new();
    attrs.insert("id".into(), json!("keep-me"));
    attrs.insert("name".into(), json!("a.txt"));
    let end = editor.doc().content_size();
    assert!(editor
        .run("insert_file", &CommandArgs::new().attrs(attrs).position(end))
        .unwrap());

    let before = locate(editor.doc(), Some("file"), "keep-me", false).unwrap();

    editor
        .chain()
        .then("insert_text", CommandArgs::new().text("a much longer ").position(1))
        .then("toggle_heading", CommandArgs::new().integer(1))
        .run()
        .unwrap();
    editor
        .run("insert_horizontal_rule", &CommandArgs::new().position(0))
        .unwrap();

    let after = locate(editor.doc(), Some("file"), "keep-me", false).unwrap();
    assert_ne!(after.pos, before.pos);
    assert_eq!(after.node.type_name(), "file");
    assert_eq!(editor.doc().node_at(after.pos), Some(&after.node));
    assert_eq!(after.node.attr_str("name"), Some("a.txt"));
}
