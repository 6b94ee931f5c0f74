//! Initial content and the pair of representations it is normalized into

use crate::errors::EditorError;
use scribe_markdown::{parse, serialize_with, MarkdownOptions};
use scribe_model::{Node, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an editor can be started from
#[derive(Debug, Clone)]
pub enum InitialContent {
    /// Markdown source
    Text(String),
    /// The tree's JSON object form
    Json(Value),
    Tree(Node),
}

/// Which view has focus. Switching never converts anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorDisplay {
    Markdown,
    #[default]
    Wysiwyg,
}

/// The same document as markdown text and as a tree
#[derive(Debug, Clone, PartialEq)]
pub struct DualContent {
    pub text: String,
    pub tree: Node,
}

impl DualContent {
    /// Normalize any initial content against `schema`. Text keeps its
    /// original formatting; trees are serialized with `options`.
    pub fn from_initial(
        content: InitialContent,
        schema: &Schema,
        options: &MarkdownOptions,
    ) -> Result<Self, EditorError> {
        match content {
            InitialContent::Text(text) => {
                let tree = parse(&text, schema);
                Ok(Self { text, tree })
            }
            InitialContent::Json(value) => Self::from_tree_json(&value, schema, options),
            // rebuilt so the tree is bound to this schema's types
            InitialContent::Tree(node) => Self::from_tree_json(&node.to_json(), schema, options),
        }
    }

    fn from_tree_json(value: &Value, schema: &Schema, options: &MarkdownOptions) -> Result<Self, EditorError> {
        let tree = schema
            .node_from_json(value)
            .map_err(|err| EditorError::InvalidContent(err.to_string()))?;

        let top = schema.top_node_type().name();
        if tree.type_name() != top {
            return Err(EditorError::InvalidContent(format!(
                "expected a '{}' node, got '{}'",
                top,
                tree.type_name()
            )));
        }

        Ok(Self {
            text: serialize_with(&tree, options),
            tree,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::starter_kit;
    use crate::Manager;
    use serde_json::json;

    fn schema() -> Schema {
        Manager::builder()
            .extend(starter_kit())
            .build()
            .unwrap()
            .schema()
            .clone()
    }

    #[test]
    fn test_text_keeps_source() {
        let schema = schema();
        let content = DualContent::from_initial(
            InitialContent::Text("* item".to_string()),
            &schema,
            &MarkdownOptions::default(),
        )
        .unwrap();

        assert_eq!(content.text, "* item");
        assert_eq!(content.tree.child(0).unwrap().type_name(), "bullet_list");
    }

    #[test]
    fn test_json_is_serialized() {
        let schema = schema();
        let value = json!({
            "type": "doc",
            "content": [
                {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "Hi"}]}
            ]
        });

        let content =
            DualContent::from_initial(InitialContent::Json(value), &schema, &MarkdownOptions::default())
                .unwrap();
        assert_eq!(content.text, "## Hi");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let schema = schema();
        let options = MarkdownOptions::default();

        for value in [
            json!({"type": "nope"}),
            json!({"type": "paragraph", "content": []}),
            json!("just a string"),
        ] {
            let result = DualContent::from_initial(InitialContent::Json(value), &schema, &options);
            assert!(matches!(result, Err(EditorError::InvalidContent(_))));
        }
    }
}
