//! # Tree → markdown
//!
//! Blocks are separated by one blank line. Inline content is written with
//! a stack of open delimiter marks so overlapping marks nest correctly:
//!
//! ```text
//! children:  "a"     "b"          "c"
//! marks:     [b]     [b, i]       [i]
//! output:    **a     _b_**        *c*     (closing bold forces italic to close)
//! ```
//!
//! Code and HTML-rendered marks are always innermost and never stacked.
//! Node and mark types without markdown syntax fall back to their `to_dom`
//! HTML; without one they degrade to plain text.
//!
//! Some trees have no markdown form and are normalized on the way out:
//!
//! - whitespace at the edge of a bold or italic run is written outside the
//!   delimiters (`italic(" a")` → ` *a*`)
//! - whitespace-only lines inside a textblock are dropped, as is a hard
//!   break with nothing after it
//! - headings are one line, so their newlines and hard breaks become spaces

use crate::names::*;
use crate::options::MarkdownOptions;
use scribe_model::{DomElement, Mark, Node};
use serde_json::Value;

/// Serialize with default options
pub fn serialize(doc: &Node) -> String {
    serialize_with(doc, &MarkdownOptions::default())
}

pub fn serialize_with(doc: &Node, options: &MarkdownOptions) -> String {
    MarkdownSerializer::new(options).serialize(doc)
}

pub struct MarkdownSerializer {
    options: MarkdownOptions,
}

/// One piece of inline output. Delimiters stay symbolic until the end so
/// italic can pick a marker that does not collide with bold.
#[derive(Debug, Clone)]
enum Piece {
    Raw(String),
    Open(Mark),
    Close(Mark),
}

/// An inline child, or part of a text child, with the marks it is written with
struct Segment<'n> {
    node: &'n Node,
    text: Option<&'n str>,
    marks: Vec<Mark>,
}

impl MarkdownSerializer {
    pub fn new(options: &MarkdownOptions) -> Self {
        Self {
            options: options.sanitized(),
        }
    }

    pub fn serialize(&self, doc: &Node) -> String {
        self.blocks(doc.children())
    }

    fn blocks(&self, children: &[Node]) -> String {
        let mut parts = Vec::new();
        let mut previous: Option<&Node> = None;
        // siblings of the same type directly before this one
        let mut streak = 0;

        for child in children {
            streak = match previous {
                Some(p) if p.type_name() == child.type_name() => streak + 1,
                _ => 0,
            };
            let part = self.block(child, streak % 2 == 1);
            previous = Some(child);
            if !part.is_empty() {
                parts.push(part);
            }
        }

        parts.join("\n\n")
    }

    /// `alternate` asks lists for the other marker so they stay separate
    /// from the list before them
    fn block(&self, node: &Node, alternate: bool) -> String {
        match node.type_name() {
            PARAGRAPH => self.inline(node),
            HEADING => self.heading(node),
            CODE_BLOCK => self.code_block(node),
            BLOCKQUOTE => prefix_lines(&self.blocks(node.children()), ">"),
            BULLET_LIST => {
                let marker = if alternate {
                    self.options.alternate_bullet()
                } else {
                    self.options.bullet_marker
                };
                self.list(node, |_| marker.to_string())
            }
            ORDERED_LIST => {
                let delimiter = if alternate { ')' } else { '.' };
                let start = node.attr(ATTR_ORDER).and_then(Value::as_u64).unwrap_or(1);
                self.list(node, |index| format!("{}{}", start + index as u64, delimiter))
            }
            HORIZONTAL_RULE => "---".to_string(),
            _ if node.is_inline() => self.inline_run(std::slice::from_ref(node), false),
            _ => self.fallback_block(node),
        }
    }

    fn heading(&self, node: &Node) -> String {
        let level = node
            .attr(ATTR_LEVEL)
            .and_then(Value::as_u64)
            .unwrap_or(1)
            .clamp(1, 6) as usize;
        let hashes = "#".repeat(level);

        let mut content = self.inline_run(node.children(), true);
        if content.ends_with('#') && !content.ends_with("\\#") {
            content.pop();
            content.push_str("\\#");
        }

        if content.is_empty() {
            hashes
        } else {
            format!("{} {}", hashes, content)
        }
    }

    fn code_block(&self, node: &Node) -> String {
        let text = node.text_content();
        let fence_char = self.options.code_fence.chars().next().unwrap_or('`');

        // a fence inside the content must be shorter than ours
        let longest = text
            .lines()
            .map(|line| line.trim_start().chars().take_while(|c| *c == fence_char).count())
            .max()
            .unwrap_or(0);
        let length = self.options.code_fence.len().max(longest + 1);
        let fence = fence_char.to_string().repeat(length);

        let language = node
            .attr(ATTR_LANGUAGE)
            .and_then(Value::as_str)
            .unwrap_or_default();

        if text.is_empty() {
            format!("{}{}\n{}", fence, language, fence)
        } else {
            format!("{}{}\n{}\n{}", fence, language, text, fence)
        }
    }

    fn list(&self, node: &Node, marker: impl Fn(usize) -> String) -> String {
        node.children()
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let marker = marker(index);
                let body = self.blocks(item.children());
                if body.is_empty() {
                    return marker;
                }

                let indent = " ".repeat(marker.chars().count() + 1);
                let mut lines = body.split('\n');
                let mut out = format!("{} {}", marker, lines.next().unwrap_or_default());
                for line in lines {
                    out.push('\n');
                    if !line.is_empty() {
                        out.push_str(&indent);
                        out.push_str(line);
                    }
                }
                out
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn fallback_block(&self, node: &Node) -> String {
        match &node.node_type().spec().to_dom {
            Some(to_dom) => to_dom(node).to_html(),
            None => {
                let text = node.text_content();
                let mut at_line_start = true;
                escape_text(&text, &mut at_line_start)
            }
        }
    }

    fn inline(&self, node: &Node) -> String {
        self.inline_run(node.children(), false)
    }

    /// `single_line` writes newlines and hard breaks as spaces
    fn inline_run(&self, children: &[Node], single_line: bool) -> String {
        let segments = segments(children);
        let mut pieces: Vec<Piece> = Vec::new();
        let mut stack: Vec<Mark> = Vec::new();
        let mut at_line_start = true;

        for (index, segment) in segments.iter().enumerate() {
            let wanted = delimited_marks(&segment.marks);

            // close everything from the first mark that ends here
            let keep = stack
                .iter()
                .position(|m| !m.is_in_set(&wanted))
                .unwrap_or(stack.len());
            while stack.len() > keep {
                if let Some(mark) = stack.pop() {
                    pieces.push(Piece::Close(mark));
                }
            }

            // open the longest-running marks first
            let mut opening: Vec<Mark> = wanted.into_iter().filter(|m| !m.is_in_set(&stack)).collect();
            opening.sort_by_key(|m| {
                let extent = segments[index..]
                    .iter()
                    .take_while(|s| m.is_in_set(&s.marks))
                    .count();
                (std::cmp::Reverse(extent), m.mark_type().rank())
            });
            for mark in opening {
                pieces.push(Piece::Open(mark.clone()));
                stack.push(mark);
            }

            let rendered = match segment.text {
                Some(text) if single_line => {
                    let flat = text.replace('\n', " ");
                    self.marked_text(segment.node, &flat, &mut at_line_start)
                }
                Some(text) => self.marked_text(segment.node, text, &mut at_line_start),
                None => self.inline_node(segment.node, &mut at_line_start, single_line),
            };
            pieces.push(Piece::Raw(rendered));
        }

        while let Some(mark) = stack.pop() {
            pieces.push(Piece::Close(mark));
        }

        tidy_lines(self.render_pieces(&pieces))
    }

    fn inline_node(&self, node: &Node, at_line_start: &mut bool, single_line: bool) -> String {
        if let Some(text) = node.text() {
            return self.marked_text(node, text, at_line_start);
        }

        let out = match node.type_name() {
            HARD_BREAK if single_line => " ".to_string(),
            HARD_BREAK => {
                *at_line_start = true;
                return "\\\n".to_string();
            }
            IMAGE => {
                let alt = node.attr_str(ATTR_ALT).unwrap_or_default();
                let src = node.attr_str(ATTR_SRC).unwrap_or_default();
                let mut ignored = false;
                format!(
                    "![{}]({})",
                    escape_text(alt, &mut ignored),
                    destination(src, node.attr_str(ATTR_TITLE))
                )
            }
            _ => match &node.node_type().spec().to_dom {
                Some(to_dom) => to_dom(node).to_html(),
                None => escape_text(&node.text_content(), at_line_start),
            },
        };
        *at_line_start = false;
        out
    }

    /// Text plus its innermost marks: code spans and HTML-rendered marks
    fn marked_text(&self, node: &Node, text: &str, at_line_start: &mut bool) -> String {
        let html_marks: Vec<&Mark> = node
            .marks()
            .iter()
            .filter(|m| !has_mark_syntax(m.name()) && m.mark_type().spec().to_dom.is_some())
            .collect();

        if let Some(mark) = html_marks.first() {
            *at_line_start = false;
            return html_mark(mark, text);
        }

        if Mark::find_in_set(CODE, node.marks()).is_some() {
            *at_line_start = false;
            return code_span(text);
        }

        escape_text(text, at_line_start)
    }

    fn render_pieces(&self, pieces: &[Piece]) -> String {
        let strong = self.options.strong_marker.as_str();
        let collides = strong.starts_with(self.options.emphasis_marker);
        let alternate = self.options.alternate_emphasis().to_string();
        let emphasis = self.options.emphasis_marker.to_string();

        let touches_strong = |index: usize| {
            let is_strong = |piece: Option<&Piece>| match piece {
                Some(Piece::Open(m)) | Some(Piece::Close(m)) => m.name() == BOLD,
                _ => false,
            };
            (index > 0 && is_strong(pieces.get(index - 1))) || is_strong(pieces.get(index + 1))
        };

        // italic spans whose open or close sits next to a bold delimiter
        let mut use_alternate = vec![false; pieces.len()];
        if collides {
            for (open, piece) in pieces.iter().enumerate() {
                let Piece::Open(mark) = piece else { continue };
                if mark.name() != ITALIC {
                    continue;
                }
                let close = pieces[open..]
                    .iter()
                    .position(|p| matches!(p, Piece::Close(m) if m.name() == ITALIC))
                    .map(|offset| open + offset);
                if let Some(close) = close {
                    if touches_strong(open) || touches_strong(close) {
                        use_alternate[open] = true;
                        use_alternate[close] = true;
                    }
                }
            }
        }

        let mut out = String::new();
        for (index, piece) in pieces.iter().enumerate() {
            match piece {
                Piece::Raw(text) => out.push_str(text),
                Piece::Open(mark) | Piece::Close(mark) if mark.name() == ITALIC => {
                    out.push_str(if use_alternate[index] { &alternate } else { &emphasis })
                }
                Piece::Open(mark) if mark.name() == BOLD => out.push_str(strong),
                Piece::Close(mark) if mark.name() == BOLD => out.push_str(strong),
                Piece::Open(mark) if mark.name() == LINK => out.push('['),
                Piece::Close(mark) if mark.name() == LINK => {
                    let href = mark.attr(ATTR_HREF).and_then(Value::as_str).unwrap_or_default();
                    let title = mark.attr(ATTR_TITLE).and_then(Value::as_str);
                    out.push_str(&format!("]({})", destination(href, title)));
                }
                Piece::Open(_) | Piece::Close(_) => {}
            }
        }
        out
    }
}

/// Split text children so whitespace at the edge of a bold or italic run
/// sits outside its delimiters. Code and HTML-marked text is kept whole.
fn segments(children: &[Node]) -> Vec<Segment<'_>> {
    let mut out = Vec::with_capacity(children.len());

    for (index, child) in children.iter().enumerate() {
        let whole = Segment {
            node: child,
            text: child.text(),
            marks: child.marks().to_vec(),
        };
        let Some(text) = child.text() else {
            out.push(whole);
            continue;
        };
        let emphasized = child.marks().iter().any(|m| is_emphasis(m.name()));
        let plain = child
            .marks()
            .iter()
            .all(|m| has_mark_syntax(m.name()) && m.name() != CODE);
        if !emphasized || !plain {
            out.push(whole);
            continue;
        }

        let before: &[Mark] = index
            .checked_sub(1)
            .and_then(|i| children.get(i))
            .map(Node::marks)
            .unwrap_or_default();
        let after: &[Mark] = children.get(index + 1).map(Node::marks).unwrap_or_default();
        let keep_if = |in_neighbours: &dyn Fn(&Mark) -> bool| -> Vec<Mark> {
            child
                .marks()
                .iter()
                .filter(|m| !is_emphasis(m.name()) || in_neighbours(m))
                .cloned()
                .collect()
        };

        let core = text.trim();
        if core.is_empty() {
            let marks = keep_if(&|m: &Mark| m.is_in_set(before) && m.is_in_set(after));
            out.push(Segment {
                node: child,
                text: Some(text),
                marks,
            });
            continue;
        }

        let start = text.len() - text.trim_start().len();
        let end = start + core.len();
        if start > 0 {
            out.push(Segment {
                node: child,
                text: Some(&text[..start]),
                marks: keep_if(&|m: &Mark| m.is_in_set(before)),
            });
        }
        out.push(Segment {
            node: child,
            text: Some(core),
            marks: child.marks().to_vec(),
        });
        if end < text.len() {
            out.push(Segment {
                node: child,
                text: Some(&text[end..]),
                marks: keep_if(&|m: &Mark| m.is_in_set(after)),
            });
        }
    }
    out
}

fn is_emphasis(name: &str) -> bool {
    matches!(name, BOLD | ITALIC)
}

/// Drop whitespace-only lines, which would end the textblock, and a hard
/// break left dangling at the end
fn tidy_lines(out: String) -> String {
    if !out.contains('\n') {
        return out;
    }
    let mut text = out
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    // escaped backslashes come in pairs, so an odd run ends in a break
    let trailing = text.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 1 {
        text.pop();
    }
    text
}

/// Marks written as surrounding delimiters, in the set's rank order
fn delimited_marks(marks: &[Mark]) -> Vec<Mark> {
    marks
        .iter()
        .filter(|m| matches!(m.name(), BOLD | ITALIC | LINK))
        .cloned()
        .collect()
}

fn html_mark(mark: &Mark, text: &str) -> String {
    let element = match &mark.mark_type().spec().to_dom {
        Some(to_dom) => to_dom(mark, text),
        None => DomElement::new("span"),
    };
    if element.text.is_empty() && !element.is_void() {
        element.with_text(text).to_html()
    } else {
        element.to_html()
    }
}

fn code_span(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        run = if c == '`' { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    let ticks = "`".repeat(longest + 1);

    let needs_padding = text.starts_with('`')
        || text.ends_with('`')
        || text.ends_with('\\')
        || (text.len() >= 2
            && text.starts_with(' ')
            && text.ends_with(' ')
            && !text.chars().all(|c| c == ' '));

    if needs_padding {
        format!("{} {} {}", ticks, text, ticks)
    } else {
        format!("{}{}{}", ticks, text, ticks)
    }
}

fn destination(href: &str, title: Option<&str>) -> String {
    let needs_brackets = href.chars().any(|c| c.is_whitespace() || c == '(' || c == ')');
    let mut out = if needs_brackets {
        format!("<{}>", href)
    } else {
        href.to_string()
    };

    if let Some(title) = title {
        out.push_str(" \"");
        for c in title.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    }
    out
}

/// Escape markdown syntax in plain text. `at_line_start` tracks whether
/// the next character begins a line, where block markers matter.
pub(crate) fn escape_text(text: &str, at_line_start: &mut bool) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if *at_line_start {
            while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
                out.push(chars[i]);
                i += 1;
            }
            if i == chars.len() {
                break;
            }

            let digits = chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
            if digits > 0 && matches!(chars.get(i + digits), Some('.') | Some(')')) {
                out.extend(&chars[i..i + digits]);
                out.push('\\');
                out.push(chars[i + digits]);
                i += digits + 1;
                *at_line_start = false;
                continue;
            }
            if matches!(chars[i], '#' | '>' | '-' | '+' | '~' | '=') {
                out.push('\\');
                out.push(chars[i]);
                i += 1;
                *at_line_start = false;
                continue;
            }
            *at_line_start = false;
        }

        let c = chars[i];
        match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '<' => {
                out.push('\\');
                out.push(c);
            }
            '!' if i + 1 == chars.len() => out.push_str("\\!"),
            '\n' => {
                out.push(c);
                *at_line_start = true;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

fn prefix_lines(text: &str, prefix: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                prefix.to_string()
            } else {
                format!("{} {}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(text: &str) -> String {
        let mut at_line_start = true;
        escape_text(text, &mut at_line_start)
    }

    #[test]
    fn test_escape_line_start_markers() {
        assert_eq!(escape("# not a heading"), "\\# not a heading");
        assert_eq!(escape("1. one"), "1\\. one");
        assert_eq!(escape("  - item"), "  \\- item");
        assert_eq!(escape("a - b"), "a - b");
        assert_eq!(escape("line\n> quote"), "line\n\\> quote");
    }

    #[test]
    fn test_escape_inline_syntax() {
        assert_eq!(escape("a*b_c`d"), "a\\*b\\_c\\`d");
        assert_eq!(escape("[x] <y>"), "\\[x\\] \\<y>");
        assert_eq!(escape("wow!"), "wow\\!");
        assert_eq!(escape("c:\\dir"), "c:\\\\dir");
    }

    #[test]
    fn test_code_span_picks_longer_fence() {
        assert_eq!(code_span("a"), "`a`");
        assert_eq!(code_span("a ` b"), "``a ` b``");
        assert_eq!(code_span("`tick"), "`` `tick ``");
        assert_eq!(code_span(" a "), "`  a  `");
        assert_eq!(code_span("dir\\"), "` dir\\ `");
    }

    #[test]
    fn test_destination_forms() {
        assert_eq!(destination("https://x.dev", None), "https://x.dev");
        assert_eq!(destination("a b", None), "<a b>");
        assert_eq!(destination("u", Some("say \"hi\"")), "u \"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_prefix_lines_keeps_blank_lines_bare() {
        assert_eq!(prefix_lines("a\n\nb", ">"), "> a\n>\n> b");
    }
}
