mod common;

use common::{block_types, manager};
use scribe_editor::extensions::starter_kit;
use scribe_editor::{priority, CommandArgs, CommandSpec, ExtensionBundle, Manager, PasteEvent, PasteRule, RegistryError};
use scribe_model::{DomElement, DomMatch, NodeSpec};

fn shouting(name: &str, level: i32, text: &'static str) -> ExtensionBundle {
    ExtensionBundle::new(name)
        .priority(level)
        .paste_rule(PasteRule::text(name, move |props, _| {
            let from = props.selection().from();
            if props.tr().insert_text(from, text).is_err() {
                return false;
            }
            props.dispatch();
            true
        }))
}

#[test]
fn test_starter_kit_builds() {
    let manager = manager();
    let schema = manager.schema();

    for name in ["doc", "paragraph", "heading", "code_block", "bullet_list", "file"] {
        assert!(schema.has_node(name), "missing node {}", name);
    }
    for name in ["toggle_bold", "toggle_heading", "insert_file", "delete_file", "undo"] {
        assert!(manager.command(name).is_some(), "missing command {}", name);
    }
    assert!(manager.has_extension("history"));
}

#[test]
fn test_paste_rules_run_by_priority() {
    let manager = Manager::builder()
        .extend(starter_kit())
        .add(shouting("quiet", priority::LOW, "low"))
        .add(shouting("loud", priority::HIGH, "high"))
        .build()
        .unwrap();

    let names: Vec<&str> = manager.paste_rules().iter().map(PasteRule::name).collect();
    let loud = names.iter().position(|n| *n == "loud").unwrap();
    let quiet = names.iter().position(|n| *n == "quiet").unwrap();
    assert!(loud < quiet);

    let schema = manager.schema().clone();
    let doc = scribe_markdown::parse("x", &schema);
    let mut editor = scribe_editor::Editor::new(manager, doc);
    assert!(editor.paste(PasteEvent::Text("plain words".to_string())).unwrap());
    assert_eq!(editor.doc().text_content(), "highx");
}

#[test]
fn test_attachment_rule_beats_link_rule() {
    let schema = manager().schema().clone();
    let element = DomElement::parse(r#"<a data-attachment="1" data-id="f1" href="https://cdn/a.pdf">a.pdf</a>"#)
        .unwrap();

    match schema.match_dom(&element) {
        Some(DomMatch::Node(node_type, attrs)) => {
            assert_eq!(node_type.name(), "file");
            assert_eq!(attrs["id"], "f1");
            assert_eq!(attrs["name"], "a.pdf");
        }
        other => panic!("expected a file node, got {:?}", other),
    }

    let plain = DomElement::parse(r#"<a href="https://x.dev">site</a>"#).unwrap();
    assert!(matches!(schema.match_dom(&plain), Some(DomMatch::Mark(mark, _)) if mark.name() == "link"));
}

#[test]
fn test_markdown_html_line_becomes_attachment() {
    let editor = common::editor_with(
        "Intro\n\n<a data-attachment=\"1\" data-id=\"f9\" href=\"https://cdn/b.png\" data-filename=\"b.png\">b.png</a>",
    );

    assert_eq!(block_types(editor.doc()), vec!["paragraph", "file"]);
    let file = editor.doc().child(1).unwrap();
    assert_eq!(file.attr_str("id"), Some("f9"));
    assert_eq!(file.attr_str("url"), Some("https://cdn/b.png"));
}

#[test]
fn test_conflicts_fail_the_build() {
    let duplicate_command = Manager::builder()
        .extend(starter_kit())
        .add(ExtensionBundle::new("again").command(CommandSpec::new("toggle_bold", vec![], |_, _| false)))
        .build();
    assert!(matches!(
        duplicate_command,
        Err(RegistryError::CommandNameConflict(name)) if name == "toggle_bold"
    ));

    let incompatible = Manager::builder()
        .extend(starter_kit())
        .add(ExtensionBundle::new("flat_heading").node(NodeSpec::new("heading").content("text*").group("block")))
        .build();
    assert!(matches!(incompatible, Err(RegistryError::SchemaConflict { name, .. }) if name == "heading"));
}

#[test]
fn test_keymap_falls_through_to_next_binding() {
    let manager = Manager::builder()
        .extend(starter_kit())
        .add(
            ExtensionBundle::new("never")
                .priority(priority::CRITICAL)
                .command(CommandSpec::new("never", vec![], |_, _| false))
                .key("Mod-b", "never"),
        )
        .build()
        .unwrap();
    assert_eq!(manager.bindings("Mod-b"), ["never".to_string(), "toggle_bold".to_string()]);

    let doc = scribe_markdown::parse("bold", manager.schema());
    let mut editor = scribe_editor::Editor::new(manager, doc);

    editor
        .run("set_selection", &CommandArgs::new().position(1).position(5))
        .unwrap();
    assert!(editor.handle_key("Mod-b").unwrap());
    assert_eq!(editor.doc().to_string(), r#"doc(paragraph(bold("bold")))"#);
}
