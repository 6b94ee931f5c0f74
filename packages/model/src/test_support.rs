//! Shared fixtures for unit tests.

use crate::node::Node;
use crate::schema::{Attrs, MarkSpec, NodeSpec, Schema};
use serde_json::{json, Value};

pub fn basic_schema() -> Schema {
    Schema::builder()
        .node(NodeSpec::new("doc").content("block+"))
        .node(NodeSpec::new("paragraph").content("inline*").group("block"))
        .node(
            NodeSpec::new("heading")
                .content("inline*")
                .group("block")
                .attr("level", json!(1)),
        )
        .node(NodeSpec::new("blockquote").content("block+").group("block"))
        .node(NodeSpec::new("horizontal_rule").group("block"))
        .node(
            NodeSpec::new("image")
                .inline()
                .group("inline")
                .required_attr("src")
                .attr("id", Value::Null)
                .attr("alt", Value::Null)
                .attr("title", Value::Null),
        )
        .node(NodeSpec::new("text").group("inline"))
        .mark(MarkSpec::new("bold"))
        .mark(MarkSpec::new("italic"))
        .build()
        .expect("fixture schema is valid")
}

pub fn doc(schema: &Schema, content: Vec<Node>) -> Node {
    schema.node("doc", Attrs::new(), content).expect("valid doc")
}

pub fn para(schema: &Schema, text: &str) -> Node {
    schema
        .node("paragraph", Attrs::new(), vec![schema.text(text)])
        .expect("valid paragraph")
}

pub fn heading(schema: &Schema, level: u8, text: &str) -> Node {
    let mut attrs = Attrs::new();
    attrs.insert("level".into(), json!(level));
    schema
        .node("heading", attrs, vec![schema.text(text)])
        .expect("valid heading")
}
