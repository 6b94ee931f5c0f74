//! The `file` attachment node, its commands and the file paste rule

use super::selection_range;
use crate::attachments::{FileAttributes, FilePasteProps, DELETED_FILE_META, FILE_NODE};
use crate::commands::{ArgKind, CommandArgs, CommandProps, CommandSpec};
use crate::extension::{ExtensionBundle, PasteRule};
use crate::resolver::{locate, ID_ATTR};
use scribe_model::transaction::DESCRIPTION_META;
use scribe_model::{Attrs, DomElement, Node, NodeSpec, ParseRule, Selection};
use serde_json::{json, Value};

/// Tried before the link mark's `a[href]` rule
pub const ATTACHMENT_RULE_PRIORITY: i32 = 100;

pub fn file() -> ExtensionBundle {
    ExtensionBundle::new("file")
        .node(file_spec())
        .command(CommandSpec::new(
            "insert_file",
            vec![ArgKind::Attrs, ArgKind::OptionalPosition],
            insert_file,
        ))
        .command(CommandSpec::new(
            "update_file",
            vec![ArgKind::Position, ArgKind::Attrs],
            |props, args| match (args.position_at(0), args.attrs_at(1)) {
                (Some(pos), Some(attrs)) => update_file(props, pos, attrs.clone()),
                _ => false,
            },
        ))
        .command(CommandSpec::new(
            "rename_file",
            vec![ArgKind::Position, ArgKind::Text],
            |props, args| match (args.position_at(0), args.text_at(1)) {
                (Some(pos), Some(name)) => {
                    let mut attrs = Attrs::new();
                    attrs.insert("name".into(), json!(name));
                    update_file(props, pos, attrs)
                }
                _ => false,
            },
        ))
        .command(CommandSpec::new("delete_file", vec![ArgKind::Position], delete_file))
        .paste_rule(PasteRule::file("file_paste", paste_files))
}

fn file_spec() -> NodeSpec {
    NodeSpec::new(FILE_NODE)
        .group("block")
        .atom()
        .attr("id", Value::Null)
        .attr("uploading", json!(false))
        .attr("url", Value::Null)
        .attr("name", Value::Null)
        .attr("mimeType", Value::Null)
        .attr("sizeBytes", Value::Null)
        .attr("extraInfo", Value::Null)
        .parse_rule(
            ParseRule::tag("a[data-attachment]")
                .priority(ATTACHMENT_RULE_PRIORITY)
                .get_attrs(file_from_element),
        )
        .to_dom(file_to_element)
}

fn file_from_element(element: &DomElement) -> Option<Attrs> {
    let record = FileAttributes {
        id: element.attr("data-id")?.to_string(),
        uploading: element.attr("data-uploading") == Some("true"),
        url: element.attr("href").map(str::to_string),
        name: element
            .attr("data-filename")
            .map(str::to_string)
            .or_else(|| (!element.text.is_empty()).then(|| element.text.clone())),
        mime_type: element.attr("data-filetype").map(str::to_string),
        size_bytes: element.attr("data-filesize").and_then(|s| s.parse().ok()),
        extra_info: element
            .attr("data-extra")
            .and_then(|s| serde_json::from_str(s).ok()),
    };
    Some(record.to_attrs())
}

fn file_to_element(node: &Node) -> DomElement {
    let record = FileAttributes::from_attrs(node.attrs()).unwrap_or_default();

    let mut element = DomElement::new("a")
        .with_attr("data-attachment", "1")
        .with_attr("data-id", record.id.as_str());
    if let Some(url) = &record.url {
        element = element.with_attr("href", url.as_str());
    }
    if let Some(name) = &record.name {
        element = element.with_attr("data-filename", name.as_str());
    }
    if let Some(mime_type) = &record.mime_type {
        element = element.with_attr("data-filetype", mime_type.as_str());
    }
    if let Some(size) = record.size_bytes {
        element = element.with_attr("data-filesize", size.to_string());
    }
    if record.uploading {
        element = element.with_attr("data-uploading", "true");
    }
    if let Some(extra) = &record.extra_info {
        element = element.with_attr("data-extra", extra.to_string());
    }
    element.with_text(record.name.unwrap_or_default())
}

/// The `file` node at `pos`, if that is what sits there now
fn file_at(doc: &Node, pos: usize) -> Option<Node> {
    doc.node_at(pos)
        .filter(|node| node.type_name() == FILE_NODE)
        .cloned()
}

fn insert_file(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let Some(attrs) = args.attrs_at(0) else {
        return false;
    };
    let Ok(node) = props.tr().schema().node(FILE_NODE, attrs.clone(), vec![]) else {
        return false;
    };
    let (from, to) = selection_range(props.selection(), args.position_at(1));
    if props.tr().replace_range_with(from, to, node).is_err() {
        return false;
    }
    props.dispatch();
    true
}

/// Merge `attrs` into the file node at `pos`. The identifier never changes.
fn update_file(props: &mut CommandProps<'_>, pos: usize, mut attrs: Attrs) -> bool {
    if file_at(props.doc(), pos).is_none() {
        return false;
    }
    attrs.remove(ID_ATTR);
    if props.tr().set_node_attrs(pos, attrs).is_err() {
        return false;
    }
    props.dispatch();
    true
}

fn delete_file(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let Some(pos) = args.position_at(0) else {
        return false;
    };
    let Some(node) = file_at(props.doc(), pos) else {
        return false;
    };

    let tr = props.tr();
    if tr.delete(pos, pos + node.node_size()).is_err() {
        return false;
    }
    tr.set_meta(
        DELETED_FILE_META,
        Value::Object(node.attrs().clone().into_iter().collect()),
    );
    props.dispatch();
    true
}

/// Insert one `file` node per pasted file, all in the paste transaction
fn paste_files(props: &mut FilePasteProps<'_>) -> bool {
    let files = props.files().to_vec();
    let schema = props.tr().schema().clone();
    if files.is_empty() || !schema.has_node(FILE_NODE) {
        return false;
    }

    let (from, to) = selection_range(props.tr().selection(), props.pos());
    let mut cursor: Option<usize> = None;

    for file in &files {
        let record = props.preview(file);
        let Ok(node) = schema.node(FILE_NODE, record.to_attrs(), vec![]) else {
            return false;
        };
        let inserted = match cursor {
            None => props.tr().replace_range_with(from, to, node).is_ok(),
            Some(pos) => props.tr().insert(pos, vec![node]).is_ok(),
        };
        if !inserted {
            return false;
        }

        // the node may have been moved out of a textblock
        let Some(found) = locate(props.tr().doc(), Some(FILE_NODE), &record.id, true) else {
            return false;
        };
        cursor = Some(found.pos + found.node.node_size());
    }

    let tr = props.tr();
    tr.set_selection(Selection::cursor(cursor.unwrap_or(from)));
    tr.set_meta(DESCRIPTION_META, "paste files");
    true
}
