//! Document, paragraph and text nodes plus commands that work on any schema

use super::{selection_range, textblock_at};
use crate::commands::{ArgKind, CommandArgs, CommandProps, CommandSpec};
use crate::extension::{priority, ExtensionBundle};
use scribe_model::{Attrs, NodeSpec, ParseRule, Selection};

pub fn document(content: &str) -> ExtensionBundle {
    ExtensionBundle::new("document")
        .priority(priority::HIGHEST)
        .node(NodeSpec::new("doc").content(content))
}

pub fn paragraph() -> ExtensionBundle {
    ExtensionBundle::new("paragraph")
        .priority(priority::HIGH)
        .node(
            NodeSpec::new("paragraph")
                .content("inline*")
                .group("block")
                .parse_rule(ParseRule::tag("p")),
        )
        .command(CommandSpec::new("set_paragraph", vec![], |props, _| {
            set_textblock_type(props, "paragraph", Attrs::new())
        }))
        .key("Mod-Alt-0", "set_paragraph")
}

pub fn text() -> ExtensionBundle {
    ExtensionBundle::new("text")
        .priority(priority::HIGHEST)
        .node(NodeSpec::new("text").group("inline"))
}

/// Editing commands independent of any node type
pub fn commands() -> ExtensionBundle {
    ExtensionBundle::new("commands")
        .priority(priority::CRITICAL)
        .command(CommandSpec::new(
            "insert_text",
            vec![ArgKind::Text, ArgKind::OptionalPosition],
            insert_text,
        ))
        .command(CommandSpec::new(
            "delete_range",
            vec![ArgKind::Position, ArgKind::Position],
            delete_range,
        ))
        .command(CommandSpec::new(
            "set_selection",
            vec![ArgKind::Position, ArgKind::Position],
            set_selection,
        ))
        .command(CommandSpec::new(
            "insert_node",
            vec![ArgKind::Node, ArgKind::OptionalPosition],
            insert_node,
        ))
        .command(CommandSpec::new(
            "update_node_attrs",
            vec![ArgKind::Position, ArgKind::Attrs],
            update_node_attrs,
        ))
}

/// Insert text at a position, or over the selection when none is given
fn insert_text(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let Some(text) = args.text_at(0) else {
        return false;
    };
    let (from, to) = selection_range(props.selection(), args.position_at(1));

    let tr = props.tr();
    if from < to && tr.delete(from, to).is_err() {
        return false;
    }
    if tr.insert_text(from, text).is_err() {
        return false;
    }
    tr.set_selection(Selection::cursor(from + text.chars().count()));

    props.dispatch();
    true
}

fn delete_range(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let (Some(from), Some(to)) = (args.position_at(0), args.position_at(1)) else {
        return false;
    };
    if from >= to || props.tr().delete(from, to).is_err() {
        return false;
    }
    props.dispatch();
    true
}

fn set_selection(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let (Some(anchor), Some(head)) = (args.position_at(0), args.position_at(1)) else {
        return false;
    };
    let size = props.doc().content_size();
    if anchor > size || head > size {
        return false;
    }
    props.tr().set_selection(Selection::range(anchor, head));
    props.dispatch();
    true
}

fn insert_node(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let Some(node) = args.node_at(0).cloned() else {
        return false;
    };
    let (from, to) = selection_range(props.selection(), args.position_at(1));
    if props.tr().replace_range_with(from, to, node).is_err() {
        return false;
    }
    props.dispatch();
    true
}

fn update_node_attrs(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let (Some(pos), Some(attrs)) = (args.position_at(0), args.attrs_at(1)) else {
        return false;
    };
    if props.doc().node_at(pos).is_none() || props.tr().set_node_attrs(pos, attrs.clone()).is_err() {
        return false;
    }
    props.dispatch();
    true
}

/// Turn the textblock around the selection into `type_name`, keeping its
/// inline content
pub(crate) fn set_textblock_type(props: &mut CommandProps<'_>, type_name: &str, attrs: Attrs) -> bool {
    let selection = props.selection();
    let Some((_, before, block)) = textblock_at(props.doc(), selection.from()) else {
        return false;
    };

    let schema = props.tr().schema().clone();
    let Ok(node_type) = schema.node_type(type_name) else {
        return false;
    };
    let content = if node_type.is_code() {
        // code keeps plain text only
        block
            .children()
            .iter()
            .filter_map(|child| child.text().map(|text| schema.text(text)))
            .collect()
    } else {
        block.children().to_vec()
    };

    let Ok(replacement) = schema.node(type_name, attrs, content) else {
        return false;
    };
    if replacement == block {
        return false;
    }

    let tr = props.tr();
    if tr.replace_with(before, before + block.node_size(), replacement).is_err() {
        return false;
    }
    tr.set_selection(selection);
    props.dispatch();
    true
}
