use scribe_model::{find_children, Attrs, EditorState, Node, NodeSpec, Schema};
use serde_json::json;

fn schema() -> Schema {
    Schema::builder()
        .node(NodeSpec::new("doc").content("block+"))
        .node(NodeSpec::new("paragraph").content("inline*").group("block"))
        .node(
            NodeSpec::new("file")
                .group("block")
                .atom()
                .attr("id", json!(null))
                .attr("uploading", json!(false)),
        )
        .node(NodeSpec::new("text").group("inline"))
        .build()
        .unwrap()
}

fn file(schema: &Schema, id: &str) -> Node {
    let mut attrs = Attrs::new();
    attrs.insert("id".into(), json!(id));
    schema.node("file", attrs, vec![]).unwrap()
}

fn paragraph(schema: &Schema, text: &str) -> Node {
    schema
        .node("paragraph", Attrs::new(), vec![schema.text(text)])
        .unwrap()
}

#[test]
fn test_mapped_position_tracks_node_across_edits() {
    let schema = schema();
    let doc = schema
        .node(
            "doc",
            Attrs::new(),
            vec![paragraph(&schema, "intro"), file(&schema, "f-1"), paragraph(&schema, "tail")],
        )
        .unwrap();
    let state = EditorState::create(schema.clone(), doc);
    let captured = 7;
    assert_eq!(state.doc().node_at(captured).unwrap().attr_str("id"), Some("f-1"));

    let mut tr = state.tr();
    tr.insert_text(1, "new ").unwrap();
    tr.insert(0, vec![paragraph(&schema, "lead")]).unwrap();
    tr.insert_text(tr.doc().content_size() - 1, "!").unwrap();
    let next = state.apply(&tr).unwrap();

    let mapped = tr.mapping().map_result(captured, 1);
    assert!(!mapped.deleted);
    let node = next.doc().node_at(mapped.pos).unwrap();
    assert_eq!(node.type_name(), "file");
    assert_eq!(node.attr_str("id"), Some("f-1"));

    let located = find_children(next.doc(), |n| n.attr_str("id") == Some("f-1"), false);
    assert_eq!(located.len(), 1);
    assert_eq!(located[0].pos, mapped.pos);
}

#[test]
fn test_deleted_node_maps_as_deleted() {
    let schema = schema();
    let doc = schema
        .node(
            "doc",
            Attrs::new(),
            vec![paragraph(&schema, "a"), file(&schema, "f-2")],
        )
        .unwrap();
    let state = EditorState::create(schema, doc);

    let mut tr = state.tr();
    tr.delete(3, 4).unwrap();

    assert!(tr.mapping().map_result(3, 1).deleted);
    assert!(find_children(tr.doc(), |n| n.type_name() == "file", true).is_empty());
}

#[test]
fn test_json_form_is_serde_compatible() {
    let schema = schema();
    let doc = schema
        .node("doc", Attrs::new(), vec![paragraph(&schema, "x"), file(&schema, "f-3")])
        .unwrap();

    let text = serde_json::to_string(&doc).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["content"][1]["attrs"]["id"], "f-3");
    assert_eq!(schema.node_from_json(&value).unwrap(), doc);
}
