#![allow(dead_code)]

use scribe_model::{Attrs, DomElement, MarkSpec, NodeSpec, ParseRule, Schema};
use serde_json::{json, Value};

fn attrs_from(element: &DomElement, pairs: &[(&str, &str)]) -> Attrs {
    pairs
        .iter()
        .filter_map(|(dom, attr)| element.attr(dom).map(|v| (attr.to_string(), json!(v))))
        .collect()
}

fn builder() -> scribe_model::SchemaBuilder {
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
        .node(
            NodeSpec::new("code_block")
                .content("text*")
                .group("block")
                .code()
                .attr("language", Value::Null),
        )
        .node(NodeSpec::new("bullet_list").content("list_item+").group("block"))
        .node(
            NodeSpec::new("ordered_list")
                .content("list_item+")
                .group("block")
                .attr("order", json!(1)),
        )
        .node(NodeSpec::new("list_item").content("paragraph block*"))
        .node(NodeSpec::new("horizontal_rule").group("block"))
        .node(
            NodeSpec::new("attachment")
                .group("block")
                .atom()
                .attr("id", Value::Null)
                .attr("href", Value::Null)
                .attr("filename", Value::Null)
                .parse_rule(ParseRule::tag("a[data-attachment]").priority(100).get_attrs(|el| {
                    Some(attrs_from(
                        el,
                        &[("data-attachment", "id"), ("href", "href"), ("data-filename", "filename")],
                    ))
                }))
                .to_dom(|node| {
                    DomElement::new("a")
                        .with_attr("data-attachment", node.attr_str("id").unwrap_or_default())
                        .with_attr("data-filename", node.attr_str("filename").unwrap_or_default())
                        .with_attr("href", node.attr_str("href").unwrap_or_default())
                        .with_text(node.attr_str("filename").unwrap_or_default())
                }),
        )
        .node(NodeSpec::new("hard_break").inline().group("inline"))
        .node(
            NodeSpec::new("image")
                .inline()
                .group("inline")
                .required_attr("src")
                .attr("alt", Value::Null)
                .attr("title", Value::Null),
        )
        .node(NodeSpec::new("text").group("inline"))
        .mark(MarkSpec::new("bold"))
        .mark(MarkSpec::new("italic"))
        .mark(MarkSpec::new("code"))
        .mark(
            MarkSpec::new("link")
                .required_attr("href")
                .attr("title", Value::Null)
                .parse_rule(ParseRule::tag("a[href]").get_attrs(|el| {
                    Some(attrs_from(el, &[("href", "href"), ("title", "title")]))
                })),
        )
        .mark(
            MarkSpec::new("underline")
                .parse_rule(ParseRule::tag("u"))
                .to_dom(|_, text| DomElement::new("u").with_text(text)),
        )
}

/// Every construct with markdown syntax plus an attachment node and an
/// HTML-only mark
pub fn markdown_schema() -> Schema {
    builder().build().unwrap()
}

/// Only documents, paragraphs and text
pub fn plain_schema() -> Schema {
    Schema::builder()
        .node(NodeSpec::new("doc").content("block+"))
        .node(NodeSpec::new("paragraph").content("inline*").group("block"))
        .node(NodeSpec::new("text").group("inline"))
        .build()
        .unwrap()
}

pub fn block_texts(doc: &scribe_model::Node) -> Vec<String> {
    doc.children().iter().map(|c| c.text_content()).collect()
}

/// Node of type `name`; `attrs` is a JSON object or null
pub fn node(schema: &Schema, name: &str, attrs: Value, content: Vec<scribe_model::Node>) -> scribe_model::Node {
    let attrs: Attrs = attrs
        .as_object()
        .map(|map| map.clone().into_iter().collect())
        .unwrap_or_default();
    schema.node(name, attrs, content).unwrap()
}

/// Text carrying the named marks, none of which take attributes
pub fn marked(schema: &Schema, text: &str, marks: &[&str]) -> scribe_model::Node {
    let marks = marks
        .iter()
        .map(|name| schema.mark(name, Attrs::new()).unwrap())
        .collect();
    schema.text_with_marks(text, marks)
}
