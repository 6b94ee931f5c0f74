use scribe_editor::{
    CommandArgs, DualEditor, EditorConfig, EditorDisplay, EditorError, InitialContent, PasteEvent,
    PastedFile, SyncStats,
};
use scribe_model::Origin;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

fn dual(text: &str) -> DualEditor {
    DualEditor::new(InitialContent::Text(text.to_string()), &EditorConfig::default()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_rapid_text_edits_resync_once() {
    let mut dual = dual("start");

    for text in ["# a", "# ab", "# abc"] {
        dual.replace_text(text).unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    assert!(!dual.poll(Instant::now()).unwrap());
    assert_eq!(dual.tree().to_string(), r#"doc(paragraph("start"))"#);

    dual.settle().await.unwrap();

    assert_eq!(
        dual.stats(),
        SyncStats {
            text_to_tree: 1,
            tree_to_text: 0
        }
    );
    assert_eq!(dual.tree().to_string(), r#"doc(heading[level=1]("abc"))"#);
    assert_eq!(dual.text(), "# abc");
}

#[tokio::test(start_paused = true)]
async fn test_deadline_is_rearmed_by_each_edit() {
    let mut dual = dual("");
    let debounce = dual.controller().debounce();

    dual.replace_text("one").unwrap();
    tokio::time::advance(debounce / 2).await;
    dual.replace_text("two").unwrap();

    // the first edit's deadline has passed, the second's has not
    tokio::time::advance(debounce / 2 + Duration::from_millis(1)).await;
    assert!(!dual.poll(Instant::now()).unwrap());

    tokio::time::advance(debounce / 2).await;
    assert!(dual.poll(Instant::now()).unwrap());
    assert_eq!(dual.tree().text_content(), "two");
}

#[test]
fn test_tree_edit_updates_text_once() {
    let mut dual = dual("Some *text*.");
    let mut text_changes = dual.text_editor_mut().subscribe();

    assert!(dual
        .run_tree("insert_text", &CommandArgs::new().text("Now ").position(1))
        .unwrap());

    assert_eq!(dual.text(), "Now Some *text*.");
    let change = text_changes.try_recv().unwrap();
    assert_eq!(change.origin, Origin::ControllerSync);
    assert!(text_changes.try_recv().is_err());

    // the controller's own write neither arms the debounce nor touches the tree
    assert!(!dual.controller().is_pending());
    assert!(!dual.flush().unwrap());
    assert_eq!(
        dual.stats(),
        SyncStats {
            text_to_tree: 0,
            tree_to_text: 1
        }
    );
}

#[test]
fn test_flush_applies_pending_text() {
    let mut dual = dual("a");
    dual.replace_text("- one\n- two").unwrap();
    assert!(dual.controller().is_pending());

    assert!(dual.flush().unwrap());
    assert_eq!(dual.tree().child(0).unwrap().type_name(), "bullet_list");
    assert!(!dual.flush().unwrap());
}

#[test]
fn test_text_edits_through_commands_arm_the_debounce() {
    let mut dual = dual("abc");
    dual.run_text("insert_text", &CommandArgs::new().text("# ").position(1))
        .unwrap();

    assert_eq!(dual.text(), "# abc");
    assert!(dual.controller().is_pending());
    assert_eq!(dual.tree().text_content(), "abc");
}

#[test]
fn test_display_switch_keeps_content() {
    let mut dual = dual("# Title");
    let before = dual.content();

    dual.set_display(EditorDisplay::Markdown);
    dual.set_display(EditorDisplay::Wysiwyg);

    assert_eq!(dual.content(), before);
    assert_eq!(dual.stats(), SyncStats::default());
}

#[test]
fn test_json_initial_content() {
    let value = json!({
        "type": "doc",
        "content": [
            {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Title"}]},
            {"type": "paragraph", "content": [
                {"type": "text", "text": "Some "},
                {"type": "text", "text": "text", "marks": [{"type": "italic"}]},
                {"type": "text", "text": "."}
            ]}
        ]
    });

    let dual = DualEditor::new(InitialContent::Json(value), &EditorConfig::default()).unwrap();
    assert_eq!(dual.text(), "# Title\n\nSome *text*.");

    let invalid = DualEditor::new(InitialContent::Json(json!({"type": "doc", "content": "no"})), &EditorConfig::default());
    assert!(matches!(invalid, Err(EditorError::InvalidContent(_))));
}

#[tokio::test(start_paused = true)]
async fn test_uploads_reach_the_text() {
    let mut dual = dual("");
    dual.tree_editor_mut()
        .paste(PasteEvent::Files {
            files: vec![PastedFile::new("a.png", "image/png", vec![1, 2, 3])],
            pos: None,
        })
        .unwrap();

    dual.pump().unwrap();
    assert!(dual.text().contains("blob:a.png"));

    dual.settle().await.unwrap();
    assert!(dual.text().contains("https://files.scribe.local/a.png"));
    assert_eq!(dual.stats().tree_to_text, 2);
    assert_eq!(dual.stats().text_to_tree, 0);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_counts_from_the_edit() {
    let mut dual = dual("abc");
    let debounce = dual.controller().debounce();

    // edited directly, not observed until the next poll
    dual.text_editor_mut()
        .run("insert_text", &CommandArgs::new().text("# ").position(1))
        .unwrap();
    tokio::time::advance(debounce + Duration::from_millis(100)).await;

    assert!(dual.poll(Instant::now()).unwrap());
    assert_eq!(dual.tree().child(0).unwrap().type_name(), "heading");
}

#[tokio::test(start_paused = true)]
async fn test_reloaded_text_keeps_file_ids_unique() {
    let mut first = dual("intro");
    first
        .tree_editor_mut()
        .paste(PasteEvent::Files {
            files: vec![PastedFile::new("one.png", "image/png", vec![1])],
            pos: Some(7),
        })
        .unwrap();
    first.settle().await.unwrap();
    let saved = first.text();

    let mut second = dual(&saved);
    let existing = file_ids(second.tree());
    assert_eq!(existing.len(), 1);

    let end = second.tree().content_size();
    second
        .tree_editor_mut()
        .paste(PasteEvent::Files {
            files: vec![PastedFile::new("two.png", "image/png", vec![2])],
            pos: Some(end),
        })
        .unwrap();
    second.settle().await.unwrap();

    let ids = file_ids(second.tree());
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], existing[0]);
    assert_ne!(ids[1], existing[0]);

    let old = second.tree().child(1).unwrap();
    assert_eq!(old.attr_str("name"), Some("one.png"));
    assert_eq!(old.attr_str("url"), Some("https://files.scribe.local/one.png"));
}

fn file_ids(doc: &scribe_model::Node) -> Vec<String> {
    doc.children()
        .iter()
        .filter(|node| node.type_name() == "file")
        .filter_map(|node| node.attr_str("id").map(str::to_string))
        .collect()
}
