//! Block node types and the commands that create or convert them

use super::base::set_textblock_type;
use super::{selection_range, textblock_at};
use crate::commands::{ArgKind, CommandArgs, CommandProps, CommandSpec};
use crate::extension::ExtensionBundle;
use scribe_model::{Attrs, DomElement, NodeSpec, ParseRule, Selection};
use serde_json::{json, Value};

pub fn heading() -> ExtensionBundle {
    let mut spec = NodeSpec::new("heading")
        .content("inline*")
        .group("block")
        .attr("level", json!(1));
    for level in 1..=6u8 {
        spec = spec.parse_rule(
            ParseRule::tag(&format!("h{}", level))
                .get_attrs(move |_: &DomElement| Some(level_attrs(level as i64))),
        );
    }

    ExtensionBundle::new("heading")
        .node(spec)
        .command(CommandSpec::new("set_heading", vec![ArgKind::Integer], |props, args| {
            match heading_level(args) {
                Some(level) => set_textblock_type(props, "heading", level_attrs(level)),
                None => false,
            }
        }))
        .command(CommandSpec::new("toggle_heading", vec![ArgKind::Integer], toggle_heading))
}

fn heading_level(args: &CommandArgs) -> Option<i64> {
    args.integer_at(0).filter(|level| (1..=6).contains(level))
}

fn level_attrs(level: i64) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("level".into(), json!(level));
    attrs
}

fn toggle_heading(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let Some(level) = heading_level(args) else {
        return false;
    };
    let current = textblock_at(props.doc(), props.selection().from()).map(|(_, _, block)| block);
    let is_same = current.is_some_and(|block| {
        block.type_name() == "heading" && block.attr("level") == Some(&json!(level))
    });

    if is_same {
        set_textblock_type(props, "paragraph", Attrs::new())
    } else {
        set_textblock_type(props, "heading", level_attrs(level))
    }
}

pub fn blockquote() -> ExtensionBundle {
    ExtensionBundle::new("blockquote")
        .node(
            NodeSpec::new("blockquote")
                .content("block+")
                .group("block")
                .parse_rule(ParseRule::tag("blockquote")),
        )
        .command(CommandSpec::new("toggle_blockquote", vec![], |props, _| {
            toggle_wrap(props, "blockquote")
        }))
        .key("Mod-Shift-b", "toggle_blockquote")
}

pub fn code_block() -> ExtensionBundle {
    ExtensionBundle::new("code_block")
        .node(
            NodeSpec::new("code_block")
                .content("text*")
                .group("block")
                .code()
                .attr("language", Value::Null)
                .parse_rule(ParseRule::tag("pre")),
        )
        .command(CommandSpec::new("set_code_block", vec![], |props, _| {
            set_textblock_type(props, "code_block", Attrs::new())
        }))
        .command(CommandSpec::new("toggle_code_block", vec![], |props, _| {
            let in_code = textblock_at(props.doc(), props.selection().from())
                .is_some_and(|(_, _, block)| block.type_name() == "code_block");
            if in_code {
                set_textblock_type(props, "paragraph", Attrs::new())
            } else {
                set_textblock_type(props, "code_block", Attrs::new())
            }
        }))
        .key("Mod-Alt-c", "toggle_code_block")
}

pub fn lists() -> ExtensionBundle {
    ExtensionBundle::new("lists")
        .node(
            NodeSpec::new("bullet_list")
                .content("list_item+")
                .group("block")
                .parse_rule(ParseRule::tag("ul")),
        )
        .node(
            NodeSpec::new("ordered_list")
                .content("list_item+")
                .group("block")
                .attr("order", json!(1))
                .parse_rule(ParseRule::tag("ol")),
        )
        .node(
            NodeSpec::new("list_item")
                .content("paragraph block*")
                .parse_rule(ParseRule::tag("li")),
        )
        .command(CommandSpec::new("toggle_bullet_list", vec![], |props, _| {
            toggle_list(props, "bullet_list")
        }))
        .command(CommandSpec::new("toggle_ordered_list", vec![], |props, _| {
            toggle_list(props, "ordered_list")
        }))
        .key("Mod-Shift-8", "toggle_bullet_list")
        .key("Mod-Shift-7", "toggle_ordered_list")
}

pub fn horizontal_rule() -> ExtensionBundle {
    ExtensionBundle::new("horizontal_rule")
        .node(
            NodeSpec::new("horizontal_rule")
                .group("block")
                .parse_rule(ParseRule::tag("hr")),
        )
        .command(CommandSpec::new(
            "insert_horizontal_rule",
            vec![ArgKind::OptionalPosition],
            |props, args| insert_leaf(props, "horizontal_rule", Attrs::new(), args.position_at(0)),
        ))
}

pub fn hard_break() -> ExtensionBundle {
    ExtensionBundle::new("hard_break")
        .node(
            NodeSpec::new("hard_break")
                .inline()
                .group("inline")
                .parse_rule(ParseRule::tag("br")),
        )
        .command(CommandSpec::new("insert_hard_break", vec![], |props, _| {
            insert_leaf(props, "hard_break", Attrs::new(), None)
        }))
        .key("Shift-Enter", "insert_hard_break")
}

pub fn image() -> ExtensionBundle {
    ExtensionBundle::new("image")
        .node(
            NodeSpec::new("image")
                .inline()
                .group("inline")
                .required_attr("src")
                .attr("alt", Value::Null)
                .attr("title", Value::Null)
                .parse_rule(ParseRule::tag("img[src]").get_attrs(|element| {
                    let mut attrs = Attrs::new();
                    for name in ["src", "alt", "title"] {
                        if let Some(value) = element.attr(name) {
                            attrs.insert(name.to_string(), json!(value));
                        }
                    }
                    Some(attrs)
                })),
        )
        .command(CommandSpec::new(
            "insert_image",
            vec![ArgKind::Attrs, ArgKind::OptionalPosition],
            |props, args| match args.attrs_at(0) {
                Some(attrs) => insert_leaf(props, "image", attrs.clone(), args.position_at(1)),
                None => false,
            },
        ))
}

/// Insert a leaf node at `pos`, or over the selection
fn insert_leaf(props: &mut CommandProps<'_>, type_name: &str, attrs: Attrs, pos: Option<usize>) -> bool {
    let Ok(node) = props.tr().schema().node(type_name, attrs, vec![]) else {
        return false;
    };
    let (from, to) = selection_range(props.selection(), pos);
    if props.tr().replace_range_with(from, to, node).is_err() {
        return false;
    }
    props.dispatch();
    true
}

/// Wrap the textblock around the selection in `wrapper`, or lift it out
/// when it already sits directly inside one
fn toggle_wrap(props: &mut CommandProps<'_>, wrapper: &str) -> bool {
    let selection = props.selection();
    let Ok(resolved) = props.doc().resolve(selection.from()) else {
        return false;
    };
    let Some((depth, before, block)) = textblock_at(props.doc(), selection.from()) else {
        return false;
    };

    let schema = props.tr().schema().clone();
    let tr = props.tr();

    if depth >= 2 && resolved.node(depth - 1).type_name() == wrapper {
        let outer = resolved.node(depth - 1).clone();
        let start = resolved.before(depth - 1);
        if tr
            .replace(start, start + outer.node_size(), outer.children().to_vec())
            .is_err()
        {
            return false;
        }
        tr.set_selection(Selection::cursor(selection.from() - 1));
    } else {
        let Ok(wrapped) = schema.node(wrapper, Attrs::new(), vec![block.clone()]) else {
            return false;
        };
        if tr.replace_with(before, before + block.node_size(), wrapped).is_err() {
            return false;
        }
        tr.set_selection(Selection::cursor(selection.from() + 1));
    }

    props.dispatch();
    true
}

/// Wrap the paragraph around the selection in a one-item list. Inside a
/// list of the same kind the whole list is unwrapped; inside the other kind
/// the list type is switched.
fn toggle_list(props: &mut CommandProps<'_>, list_type: &str) -> bool {
    let selection = props.selection();
    let Ok(resolved) = props.doc().resolve(selection.from()) else {
        return false;
    };
    let Some((depth, before, block)) = textblock_at(props.doc(), selection.from()) else {
        return false;
    };

    let schema = props.tr().schema().clone();
    let tr = props.tr();
    let in_list = depth >= 3
        && resolved.node(depth - 1).type_name() == "list_item"
        && matches!(resolved.node(depth - 2).type_name(), "bullet_list" | "ordered_list");

    if in_list {
        let list = resolved.node(depth - 2).clone();
        let start = resolved.before(depth - 2);
        let end = start + list.node_size();

        if list.type_name() == list_type {
            let blocks = list
                .children()
                .iter()
                .flat_map(|item| item.children().iter().cloned())
                .collect();
            if tr.replace(start, end, blocks).is_err() {
                return false;
            }
            tr.set_selection(Selection::cursor(selection.from() - 2));
        } else {
            let Ok(switched) = schema.node(list_type, Attrs::new(), list.children().to_vec()) else {
                return false;
            };
            if tr.replace_with(start, end, switched).is_err() {
                return false;
            }
            tr.set_selection(selection);
        }
    } else {
        let wrapped = schema
            .node("list_item", Attrs::new(), vec![block.clone()])
            .and_then(|item| schema.node(list_type, Attrs::new(), vec![item]));
        let Ok(wrapped) = wrapped else {
            return false;
        };
        if tr.replace_with(before, before + block.node_size(), wrapped).is_err() {
            return false;
        }
        tr.set_selection(Selection::cursor(selection.from() + 2));
    }

    props.dispatch();
    true
}

#[cfg(test)]
mod tests {
    use crate::test_support::{editor_with, rich_editor};
    use crate::CommandArgs;

    #[test]
    fn test_toggle_heading() {
        let mut editor = rich_editor("Title");
        let args = CommandArgs::new().integer(2);

        assert!(editor.run("toggle_heading", &args).unwrap());
        assert_eq!(editor.doc().to_string(), r#"doc(heading[level=2]("Title"))"#);

        assert!(editor.run("toggle_heading", &args).unwrap());
        assert_eq!(editor.doc().to_string(), r#"doc(paragraph("Title"))"#);

        assert!(!editor.run("set_heading", &CommandArgs::new().integer(9)).unwrap());
    }

    #[test]
    fn test_toggle_blockquote_wraps_and_lifts() {
        let mut editor = rich_editor("quote me");

        assert!(editor.run("toggle_blockquote", &CommandArgs::new()).unwrap());
        assert_eq!(editor.doc().to_string(), r#"doc(blockquote(paragraph("quote me")))"#);
        assert_eq!(editor.state().selection().head, 2);

        assert!(editor.run("toggle_blockquote", &CommandArgs::new()).unwrap());
        assert_eq!(editor.doc().to_string(), r#"doc(paragraph("quote me"))"#);
    }

    #[test]
    fn test_toggle_lists() {
        let mut editor = rich_editor("item");

        assert!(editor.run("toggle_bullet_list", &CommandArgs::new()).unwrap());
        assert_eq!(editor.doc().to_string(), r#"doc(bullet_list(list_item(paragraph("item"))))"#);

        assert!(editor.run("toggle_ordered_list", &CommandArgs::new()).unwrap());
        assert_eq!(
            editor.doc().to_string(),
            r#"doc(ordered_list[order=1](list_item(paragraph("item"))))"#
        );

        assert!(editor.run("toggle_ordered_list", &CommandArgs::new()).unwrap());
        assert_eq!(editor.doc().to_string(), r#"doc(paragraph("item"))"#);
    }

    #[test]
    fn test_code_block_drops_marks() {
        let mut editor = editor_with("some **bold** text");

        assert!(editor.run("toggle_code_block", &CommandArgs::new()).unwrap());
        assert_eq!(
            editor.doc().to_string(),
            r#"doc(code_block[language=null]("some bold text"))"#
        );
    }

    #[test]
    fn test_insert_horizontal_rule_splits_out_of_paragraph() {
        let mut editor = rich_editor("ab");
        assert!(editor
            .run("insert_horizontal_rule", &CommandArgs::new().position(3))
            .unwrap());
        assert_eq!(editor.doc().to_string(), r#"doc(paragraph("ab"), horizontal_rule)"#);
    }
}
