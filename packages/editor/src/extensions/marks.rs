//! Inline marks with toggle commands and the link autolink paste rule

use crate::commands::{ArgKind, CommandArgs, CommandProps, CommandSpec};
use crate::extension::{ExtensionBundle, PasteRule};
use regex::Regex;
use scribe_model::{Attrs, Mark, MarkSpec, ParseRule};
use serde_json::{json, Value};
use tracing::warn;

/// URLs in pasted text become links
pub const URL_PATTERN: &str = r#"https?://[^\s<>"'\)\]]+"#;

pub fn bold() -> ExtensionBundle {
    toggled_mark(
        MarkSpec::new("bold")
            .parse_rule(ParseRule::tag("strong"))
            .parse_rule(ParseRule::tag("b")),
        "toggle_bold",
        "Mod-b",
    )
}

pub fn italic() -> ExtensionBundle {
    toggled_mark(
        MarkSpec::new("italic")
            .parse_rule(ParseRule::tag("em"))
            .parse_rule(ParseRule::tag("i")),
        "toggle_italic",
        "Mod-i",
    )
}

pub fn code() -> ExtensionBundle {
    toggled_mark(
        MarkSpec::new("code").parse_rule(ParseRule::tag("code")),
        "toggle_code",
        "Mod-e",
    )
}

fn toggled_mark(spec: MarkSpec, command: &str, key: &str) -> ExtensionBundle {
    let name = spec.name.clone();
    let mark_name = name.clone();
    ExtensionBundle::new(name)
        .mark(spec)
        .command(CommandSpec::new(command, vec![], move |props, _| {
            toggle_mark(props, &mark_name)
        }))
        .key(key, command)
}

pub fn link() -> ExtensionBundle {
    let bundle = ExtensionBundle::new("link")
        .mark(
            MarkSpec::new("link")
                .required_attr("href")
                .attr("title", Value::Null)
                .parse_rule(ParseRule::tag("a[href]").get_attrs(|element| {
                    let mut attrs = Attrs::new();
                    for name in ["href", "title"] {
                        if let Some(value) = element.attr(name) {
                            attrs.insert(name.to_string(), json!(value));
                        }
                    }
                    Some(attrs)
                })),
        )
        .command(CommandSpec::new("set_link", vec![ArgKind::Text], set_link))
        .command(CommandSpec::new("remove_link", vec![], |props, _| {
            let selection = props.selection();
            if !matches!(mark_coverage(props, "link"), Some((true, _))) {
                return false;
            }
            if props
                .tr()
                .remove_mark(selection.from(), selection.to(), "link")
                .is_err()
            {
                return false;
            }
            props.dispatch();
            true
        }));

    match Regex::new(URL_PATTERN) {
        Ok(pattern) => bundle.paste_rule(PasteRule::mark("autolink", pattern, "link", |captures| {
            let mut attrs = Attrs::new();
            attrs.insert("href".into(), json!(captures.get(0)?.as_str()));
            Some(attrs)
        })),
        Err(err) => {
            warn!(%err, "autolink pattern does not compile");
            bundle
        }
    }
}

fn set_link(props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
    let Some(href) = args.text_at(0) else {
        return false;
    };
    let selection = props.selection();
    if selection.is_empty() {
        return false;
    }

    let mut attrs = Attrs::new();
    attrs.insert("href".into(), json!(href));
    let Ok(mark) = props.tr().schema().mark("link", attrs) else {
        return false;
    };
    if props
        .tr()
        .add_mark(selection.from(), selection.to(), mark)
        .is_err()
    {
        return false;
    }
    props.dispatch();
    true
}

/// `(any, all)`: whether some or every text node in the selection carries
/// mark `name`. `None` when the selection holds no text.
fn mark_coverage(props: &CommandProps<'_>, name: &str) -> Option<(bool, bool)> {
    let selection = props.selection();
    if selection.is_empty() {
        return None;
    }

    let mut coverage: Option<(bool, bool)> = None;
    props
        .doc()
        .nodes_between(selection.from(), selection.to(), |node, _| {
            if node.is_text() {
                let has = Mark::find_in_set(name, node.marks()).is_some();
                let (any, all) = coverage.unwrap_or((false, true));
                coverage = Some((any || has, all && has));
            }
            true
        });
    coverage
}

/// Add the mark to the selection, or remove it when all selected text
/// already has it
fn toggle_mark(props: &mut CommandProps<'_>, name: &str) -> bool {
    let Some((_, all)) = mark_coverage(props, name) else {
        return false;
    };
    let selection = props.selection();
    let (from, to) = (selection.from(), selection.to());

    let result = if all {
        props.tr().remove_mark(from, to, name).map(|_| ())
    } else {
        match props.tr().schema().mark(name, Attrs::new()) {
            Ok(mark) => props.tr().add_mark(from, to, mark).map(|_| ()),
            Err(_) => return false,
        }
    };
    if result.is_err() {
        return false;
    }

    props.dispatch();
    true
}
