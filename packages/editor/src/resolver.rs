//! # Node-Identity Resolver
//!
//! Finds a node again by its `id` attribute after positions have shifted.
//! A miss is not an error: callers drop whatever update they were about to
//! apply.

use scribe_model::{find_children, Node, NodeWithPos};
use tracing::debug;

/// Attribute every identity-tracked node carries
pub const ID_ATTR: &str = "id";

/// Locate the node with `id` (and `node_type`, if given) in `doc`.
///
/// With `descend = false` only the direct children of `doc` are searched.
pub fn locate(doc: &Node, node_type: Option<&str>, id: &str, descend: bool) -> Option<NodeWithPos> {
    let found = find_children(
        doc,
        |node| {
            node.attr_str(ID_ATTR) == Some(id)
                && node_type.map_or(true, |expected| node.type_name() == expected)
        },
        descend,
    )
    .into_iter()
    .next();

    if found.is_none() {
        debug!(id, node_type, "no node with identifier");
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_model::{Attrs, NodeSpec, Schema};

    fn schema() -> Schema {
        Schema::builder()
            .node(NodeSpec::new("doc").content("block+"))
            .node(NodeSpec::new("paragraph").content("inline*").group("block"))
            .node(NodeSpec::new("blockquote").content("block+").group("block"))
            .node(
                NodeSpec::new("box")
                    .group("block")
                    .atom()
                    .attr("id", serde_json::Value::Null),
            )
            .node(NodeSpec::new("text").group("inline"))
            .build()
            .unwrap()
    }

    fn boxed(schema: &Schema, id: &str) -> Node {
        let mut attrs = Attrs::new();
        attrs.insert("id".into(), id.into());
        schema.node("box", attrs, vec![]).unwrap()
    }

    #[test]
    fn test_locate_top_level_and_nested() {
        let schema = schema();
        let quote = schema
            .node("blockquote", Attrs::new(), vec![boxed(&schema, "inner")])
            .unwrap();
        let doc = schema
            .node("doc", Attrs::new(), vec![boxed(&schema, "outer"), quote])
            .unwrap();

        let outer = locate(&doc, Some("box"), "outer", false).unwrap();
        assert_eq!(outer.pos, 0);

        assert!(locate(&doc, Some("box"), "inner", false).is_none());
        let inner = locate(&doc, Some("box"), "inner", true).unwrap();
        assert_eq!(inner.pos, 2);
        assert_eq!(inner.node.attr_str("id"), Some("inner"));
    }

    #[test]
    fn test_type_must_match() {
        let schema = schema();
        let doc = schema
            .node("doc", Attrs::new(), vec![boxed(&schema, "a")])
            .unwrap();

        assert!(locate(&doc, Some("paragraph"), "a", true).is_none());
        assert!(locate(&doc, None, "a", true).is_some());
        assert!(locate(&doc, None, "missing", true).is_none());
    }
}
