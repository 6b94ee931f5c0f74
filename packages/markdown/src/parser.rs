//! # Markdown → tree
//!
//! Two passes, the way the text is laid out:
//!
//! 1. **Blocks** are recognised line by line (fences, headings, rules,
//!    quotes, lists, single-line HTML, paragraphs). Quotes and list items
//!    strip their prefix and recurse.
//! 2. **Inline** content is tokenized with logos and parsed recursively;
//!    an opener without a matching closer backtracks to literal text.
//!
//! Parsing never fails. Anything the schema cannot hold degrades to a
//! paragraph containing the literal source.

use crate::names::*;
use crate::tokenizer::{tokenize, InlineToken};
use scribe_model::{Attrs, DomElement, DomMatch, Mark, Node, NodeType, Schema};
use serde_json::{json, Value};
use std::ops::Range;
use tracing::trace;

/// Parse markdown into a document for `schema`
pub fn parse(text: &str, schema: &Schema) -> Node {
    MarkdownParser::new(schema).parse(text)
}

pub struct MarkdownParser<'s> {
    schema: &'s Schema,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ListMarker<'a> {
    ordered: bool,
    /// Bullet character, or the delimiter after the number
    symbol: char,
    number: u64,
    width: usize,
    content: &'a str,
}

impl<'a> ListMarker<'a> {
    fn same_list(&self, other: &ListMarker<'_>) -> bool {
        self.ordered == other.ordered && self.symbol == other.symbol
    }
}

impl<'s> MarkdownParser<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    pub fn parse(&self, text: &str) -> Node {
        let normalized = text.replace("\r\n", "\n");
        let lines: Vec<&str> = normalized.split('\n').collect();
        let blocks = self.parse_blocks(&lines);
        self.build_doc(blocks)
    }

    fn build_doc(&self, blocks: Vec<Node>) -> Node {
        let top = self.schema.top_node_type().name().to_string();
        if let Ok(doc) = self.schema.node(&top, Attrs::new(), blocks.clone()) {
            return doc;
        }

        if blocks.is_empty() {
            if let Some(doc) = self
                .make(PARAGRAPH, Attrs::new(), Vec::new())
                .and_then(|p| self.schema.node(&top, Attrs::new(), vec![p]).ok())
            {
                return doc;
            }
        }

        trace!("document content rejected by schema, keeping blocks unchecked");
        self.schema.top_node_unchecked(blocks)
    }

    fn make(&self, name: &str, attrs: Attrs, content: Vec<Node>) -> Option<Node> {
        if !self.schema.has_node(name) {
            return None;
        }
        self.schema.node(name, attrs, content).ok()
    }

    /// Paragraph holding `raw` verbatim
    fn literal(&self, raw: &str) -> Option<Node> {
        let content = if raw.is_empty() {
            Vec::new()
        } else {
            vec![self.schema.text(raw)]
        };
        self.make(PARAGRAPH, Attrs::new(), content)
    }

    fn parse_blocks(&self, lines: &[&str]) -> Vec<Node> {
        let mut blocks = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            if line.trim().is_empty() {
                i += 1;
                continue;
            }

            if let Some((fence, length, info)) = fence_open(line) {
                i = self.code_block(lines, i, fence, length, info, &mut blocks);
                continue;
            }

            if let Some((level, content)) = atx_heading(line) {
                let mut attrs = Attrs::new();
                attrs.insert(ATTR_LEVEL.into(), json!(level));
                let node = self
                    .make(HEADING, attrs, self.parse_inline(content))
                    .or_else(|| self.literal(line.trim()));
                blocks.extend(node);
                i += 1;
                continue;
            }

            if is_thematic_break(line) {
                let node = self
                    .make(HORIZONTAL_RULE, Attrs::new(), Vec::new())
                    .or_else(|| self.literal(line.trim()));
                blocks.extend(node);
                i += 1;
                continue;
            }

            if blockquote_line(line).is_some() {
                let start = i;
                let mut inner = Vec::new();
                while let Some(stripped) = lines.get(i).and_then(|l| blockquote_line(l)) {
                    inner.push(stripped);
                    i += 1;
                }
                let content = self.parse_blocks(&inner);
                let node = self
                    .make(BLOCKQUOTE, Attrs::new(), content)
                    .or_else(|| self.literal(&lines[start..i].join("\n")));
                blocks.extend(node);
                continue;
            }

            if let Some(marker) = list_marker(line) {
                i = self.list(lines, i, marker, &mut blocks);
                continue;
            }

            if let Some(node) = self.html_block(line) {
                blocks.push(node);
                i += 1;
                continue;
            }

            let start = i;
            i += 1;
            while i < lines.len() && !lines[i].trim().is_empty() && !self.starts_block(lines[i]) {
                i += 1;
            }
            blocks.extend(self.paragraph(&lines[start..i].join("\n")));
        }

        blocks
    }

    fn starts_block(&self, line: &str) -> bool {
        fence_open(line).is_some()
            || atx_heading(line).is_some()
            || is_thematic_break(line)
            || blockquote_line(line).is_some()
            || list_marker(line).is_some()
            || (line.trim_start().starts_with('<') && self.html_block(line).is_some())
    }

    fn paragraph(&self, text: &str) -> Option<Node> {
        self.make(PARAGRAPH, Attrs::new(), self.parse_inline(text))
            .or_else(|| self.literal(text))
    }

    fn code_block(
        &self,
        lines: &[&str],
        start: usize,
        fence: char,
        length: usize,
        info: &str,
        blocks: &mut Vec<Node>,
    ) -> usize {
        let mut i = start + 1;
        let mut body = Vec::new();
        while i < lines.len() {
            if is_fence_close(lines[i], fence, length) {
                i += 1;
                break;
            }
            body.push(lines[i]);
            i += 1;
        }

        let text = body.join("\n");
        let mut attrs = Attrs::new();
        if !info.is_empty() {
            attrs.insert(ATTR_LANGUAGE.into(), json!(info));
        }
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![self.schema.text(text)]
        };

        let node = self
            .make(CODE_BLOCK, attrs, content)
            .or_else(|| self.literal(&lines[start..i].join("\n")));
        blocks.extend(node);
        i
    }

    fn list(&self, lines: &[&str], start: usize, first: ListMarker<'_>, blocks: &mut Vec<Node>) -> usize {
        let mut items = Vec::new();
        let mut i = start;

        while let Some(marker) = lines.get(i).and_then(|l| list_marker(l)) {
            if !marker.same_list(&first) {
                break;
            }

            let mut item_lines = vec![marker.content.to_string()];
            i += 1;
            while i < lines.len() {
                let line = lines[i];
                if line.trim().is_empty() {
                    // blank lines stay in the item only when indented content follows
                    match next_non_blank(lines, i) {
                        Some(j) if indent_of(lines[j]) >= marker.width => {
                            item_lines.extend((i..j).map(|_| String::new()));
                            i = j;
                            continue;
                        }
                        _ => break,
                    }
                }
                if indent_of(line) < marker.width {
                    break;
                }
                item_lines.push(strip_indent(line, marker.width));
                i += 1;
            }

            items.push(self.list_item(&item_lines));

            match next_non_blank(lines, i) {
                Some(j) if list_marker(lines[j]).map_or(false, |m| m.same_list(&first)) => i = j,
                _ => break,
            }
        }

        let (name, attrs) = if first.ordered {
            let mut attrs = Attrs::new();
            attrs.insert(ATTR_ORDER.into(), json!(first.number));
            (ORDERED_LIST, attrs)
        } else {
            (BULLET_LIST, Attrs::new())
        };

        let list = items
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .and_then(|items| self.make(name, attrs, items));
        let end = i.min(lines.len());
        blocks.extend(list.or_else(|| self.literal(lines[start..end].join("\n").trim_end())));
        end
    }

    fn list_item(&self, lines: &[String]) -> Option<Node> {
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut content = self.parse_blocks(&refs);

        if let Some(item) = self.make(LIST_ITEM, Attrs::new(), content.clone()) {
            return Some(item);
        }

        // items must open with a paragraph
        let starts_with_paragraph = content.first().map_or(false, |n| n.type_name() == PARAGRAPH);
        if !starts_with_paragraph {
            content.insert(0, self.make(PARAGRAPH, Attrs::new(), Vec::new())?);
        }
        self.make(LIST_ITEM, Attrs::new(), content)
    }

    fn html_block(&self, line: &str) -> Option<Node> {
        let element = DomElement::parse(line)?;
        match self.schema.match_dom(&element)? {
            DomMatch::Node(node_type, attrs) if node_type.is_inline() => {
                let inline = self.node_from_element(&node_type, attrs, &element)?;
                self.make(PARAGRAPH, Attrs::new(), vec![inline])
            }
            DomMatch::Node(node_type, attrs) => self.node_from_element(&node_type, attrs, &element),
            DomMatch::Mark(..) => None,
        }
    }

    fn node_from_element(&self, node_type: &NodeType, attrs: Attrs, element: &DomElement) -> Option<Node> {
        let content = if node_type.is_leaf() || element.text.is_empty() {
            Vec::new()
        } else if node_type.is_textblock() || node_type.is_inline() {
            vec![self.schema.text(element.text.clone())]
        } else {
            vec![self.literal(&element.text)?]
        };
        self.schema.node(node_type.name(), attrs, content).ok()
    }

    fn parse_inline(&self, text: &str) -> Vec<Node> {
        InlineParser::new(self, text).run()
    }
}

struct InlineParser<'p, 's, 'src> {
    parser: &'p MarkdownParser<'s>,
    source: &'src str,
    tokens: Vec<(InlineToken<'src>, Range<usize>)>,
    pos: usize,
}

impl<'p, 's, 'src> InlineParser<'p, 's, 'src> {
    fn new(parser: &'p MarkdownParser<'s>, source: &'src str) -> Self {
        Self {
            parser,
            source,
            tokens: tokenize(source),
            pos: 0,
        }
    }

    fn schema(&self) -> &'s Schema {
        self.parser.schema
    }

    fn run(mut self) -> Vec<Node> {
        self.parse_until(&[], None).unwrap_or_default()
    }

    /// Parse up to and including `stop`. `None` when `stop` never shows up.
    fn parse_until(&mut self, marks: &[Mark], stop: Option<&InlineToken<'src>>) -> Option<Vec<Node>> {
        let mut nodes = Vec::new();

        while let Some((token, span)) = self.tokens.get(self.pos).cloned() {
            if stop == Some(&token) {
                self.pos += 1;
                return Some(nodes);
            }
            self.pos += 1;

            match token {
                InlineToken::Text(text) | InlineToken::Escaped(text) => {
                    self.push_text(&mut nodes, text, marks)
                }
                InlineToken::Newline => self.push_text(&mut nodes, "\n", marks),
                InlineToken::HardBreak => match self.parser.make(HARD_BREAK, Attrs::new(), Vec::new()) {
                    Some(node) => nodes.push(node.mark(marks.to_vec())),
                    None => self.push_text(&mut nodes, "\n", marks),
                },
                InlineToken::Star | InlineToken::Underscore => {
                    self.emphasis(&mut nodes, marks, &token, ITALIC, span)
                }
                InlineToken::DoubleStar | InlineToken::DoubleUnderscore => {
                    self.emphasis(&mut nodes, marks, &token, BOLD, span)
                }
                InlineToken::Backticks(count) => self.code_span(&mut nodes, marks, count, span),
                InlineToken::LBracket => self.link(&mut nodes, marks, span),
                InlineToken::ImageOpen => self.image(&mut nodes, marks, span),
                InlineToken::HtmlOpen(_) => self.html(&mut nodes, marks, span),
                InlineToken::HtmlClose(_)
                | InlineToken::RBracket
                | InlineToken::LParen
                | InlineToken::RParen
                | InlineToken::Bang
                | InlineToken::Backslash
                | InlineToken::LAngle => {
                    let literal = &self.source[span];
                    self.push_text(&mut nodes, literal, marks)
                }
            }
        }

        stop.is_none().then_some(nodes)
    }

    fn push_text(&self, nodes: &mut Vec<Node>, text: &str, marks: &[Mark]) {
        if !text.is_empty() {
            nodes.push(self.schema().text_with_marks(text, marks.to_vec()));
        }
    }

    /// Move past every token starting before `offset`
    fn skip_to(&mut self, offset: usize) {
        while self.tokens.get(self.pos).map_or(false, |(_, span)| span.start < offset) {
            self.pos += 1;
        }
    }

    fn emphasis(
        &mut self,
        nodes: &mut Vec<Node>,
        marks: &[Mark],
        token: &InlineToken<'src>,
        mark_name: &str,
        span: Range<usize>,
    ) {
        let start = self.pos;
        if let Ok(mark) = self.schema().mark(mark_name, Attrs::new()) {
            let inner_marks = mark.add_to_set(marks);
            if let Some(inner) = self.parse_until(&inner_marks, Some(token)) {
                if !inner.is_empty() {
                    nodes.extend(inner);
                    return;
                }
            }
        }

        self.pos = start;
        let literal = &self.source[span];
        self.push_text(nodes, literal, marks);
    }

    fn code_span(&mut self, nodes: &mut Vec<Node>, marks: &[Mark], count: usize, span: Range<usize>) {
        let close = self.tokens[self.pos..]
            .iter()
            .position(|(t, _)| *t == InlineToken::Backticks(count))
            .map(|offset| self.pos + offset);

        let Some(close) = close else {
            let literal = &self.source[span];
            return self.push_text(nodes, literal, marks);
        };

        let close_span = self.tokens[close].1.clone();
        self.pos = close + 1;

        match self.schema().mark(CODE, Attrs::new()) {
            Ok(code) => {
                let content = strip_code_padding(&self.source[span.end..close_span.start]);
                self.push_text(nodes, content, &code.add_to_set(marks));
            }
            Err(_) => {
                let literal = &self.source[span.start..close_span.end];
                self.push_text(nodes, literal, marks);
            }
        }
    }

    fn link(&mut self, nodes: &mut Vec<Node>, marks: &[Mark], span: Range<usize>) {
        let start = self.pos;

        if let Some(inner) = self.parse_until(marks, Some(&InlineToken::RBracket)) {
            if !inner.is_empty() {
                if let Some((href, title)) = self.link_target() {
                    let mut attrs = Attrs::new();
                    attrs.insert(ATTR_HREF.into(), Value::String(href));
                    attrs.insert(ATTR_TITLE.into(), title.map_or(Value::Null, Value::String));
                    if let Ok(link) = self.schema().mark(LINK, attrs) {
                        nodes.extend(inner.into_iter().map(|n| {
                            let marks = link.add_to_set(n.marks());
                            n.mark(marks)
                        }));
                        return;
                    }
                }
            }
        }

        self.pos = start;
        let literal = &self.source[span];
        self.push_text(nodes, literal, marks);
    }

    fn image(&mut self, nodes: &mut Vec<Node>, marks: &[Mark], span: Range<usize>) {
        let start = self.pos;
        let close = self.tokens[self.pos..]
            .iter()
            .position(|(t, _)| *t == InlineToken::RBracket)
            .map(|offset| self.pos + offset);

        if let Some(close) = close {
            let alt = unescape(&self.source[span.end..self.tokens[close].1.start]);
            self.pos = close + 1;
            if let Some((src, title)) = self.link_target() {
                let mut attrs = Attrs::new();
                attrs.insert(ATTR_SRC.into(), Value::String(src));
                attrs.insert(
                    ATTR_ALT.into(),
                    if alt.is_empty() { Value::Null } else { Value::String(alt) },
                );
                attrs.insert(ATTR_TITLE.into(), title.map_or(Value::Null, Value::String));
                if let Some(image) = self.parser.make(IMAGE, attrs, Vec::new()) {
                    nodes.push(image.mark(marks.to_vec()));
                    return;
                }
            }
        }

        self.pos = start;
        let literal = &self.source[span];
        self.push_text(nodes, literal, marks);
    }

    /// `(destination "title")` directly after a closing bracket
    fn link_target(&mut self) -> Option<(String, Option<String>)> {
        let (token, span) = self.tokens.get(self.pos)?.clone();
        if token != InlineToken::LParen {
            return None;
        }

        let (href, title, used) = parse_destination(&self.source[span.end..])?;
        self.skip_to(span.end + used);
        Some((href, title))
    }

    fn html(&mut self, nodes: &mut Vec<Node>, marks: &[Mark], span: Range<usize>) {
        if let Some((element, used)) = DomElement::parse_prefix(&self.source[span.start..]) {
            match self.schema().match_dom(&element) {
                Some(DomMatch::Mark(mark_type, attrs)) => {
                    if let Ok(mark) = mark_type.create(&attrs) {
                        self.push_text(nodes, &element.text, &mark.add_to_set(marks));
                        self.skip_to(span.start + used);
                        return;
                    }
                }
                Some(DomMatch::Node(node_type, attrs)) if node_type.is_inline() => {
                    if let Some(node) = self.parser.node_from_element(&node_type, attrs, &element) {
                        nodes.push(node.mark(marks.to_vec()));
                        self.skip_to(span.start + used);
                        return;
                    }
                }
                _ => {}
            }
        }

        let literal = &self.source[span];
        self.push_text(nodes, literal, marks);
    }
}

fn strip_code_padding(raw: &str) -> &str {
    let padded = raw.len() >= 2 && raw.starts_with(' ') && raw.ends_with(' ');
    if padded && !raw.chars().all(|c| c == ' ') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Drop backslashes in front of ASCII punctuation
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_punctuation() {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Parse `dest "title")`, returning the bytes consumed including `)`
fn parse_destination(rest: &str) -> Option<(String, Option<String>, usize)> {
    let bytes: Vec<(usize, char)> = rest.char_indices().collect();
    let mut i = 0;
    let skip_spaces = |i: &mut usize| {
        while bytes.get(*i).map_or(false, |(_, c)| *c == ' ') {
            *i += 1;
        }
    };

    skip_spaces(&mut i);
    let mut href = String::new();
    if bytes.get(i).map(|(_, c)| *c) == Some('<') {
        i += 1;
        loop {
            let (_, c) = *bytes.get(i)?;
            i += 1;
            match c {
                '>' => break,
                '\n' => return None,
                _ => href.push(c),
            }
        }
    } else {
        while let Some(&(_, c)) = bytes.get(i) {
            if c.is_whitespace() || c == ')' {
                break;
            }
            if c == '\\' {
                if let Some(&(_, next)) = bytes.get(i + 1) {
                    if next.is_ascii_punctuation() {
                        href.push(next);
                        i += 2;
                        continue;
                    }
                }
            }
            href.push(c);
            i += 1;
        }
    }

    skip_spaces(&mut i);
    let mut title = None;
    if bytes.get(i).map(|(_, c)| *c) == Some('"') {
        i += 1;
        let mut value = String::new();
        loop {
            let (_, c) = *bytes.get(i)?;
            i += 1;
            match c {
                '"' => break,
                '\\' => {
                    let (_, next) = *bytes.get(i)?;
                    value.push(next);
                    i += 1;
                }
                _ => value.push(c),
            }
        }
        title = Some(value);
        skip_spaces(&mut i);
    }

    let (offset, c) = *bytes.get(i)?;
    if c != ')' {
        return None;
    }
    Some((href, title, offset + 1))
}

fn indent_of(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn strip_indent(line: &str, width: usize) -> String {
    let mut removed = 0;
    let mut chars = line.char_indices();
    for (index, c) in chars.by_ref() {
        if removed >= width || !(c == ' ' || c == '\t') {
            return line[index..].to_string();
        }
        removed += if c == '\t' { 4 } else { 1 };
    }
    String::new()
}

fn next_non_blank(lines: &[&str], from: usize) -> Option<usize> {
    (from..lines.len()).find(|&j| !lines[j].trim().is_empty())
}

fn fence_open(line: &str) -> Option<(char, usize, &str)> {
    if indent_of(line) > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    let fence = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let length = trimmed.chars().take_while(|c| *c == fence).count();
    if length < 3 {
        return None;
    }
    let info = trimmed[length..].trim();
    if fence == '`' && info.contains('`') {
        return None;
    }
    Some((fence, length, info))
}

fn is_fence_close(line: &str, fence: char, length: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= length && trimmed.chars().all(|c| c == fence)
}

fn atx_heading(line: &str) -> Option<(usize, &str)> {
    if indent_of(line) > 3 {
        return None;
    }
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
        return None;
    }

    let mut content = rest.trim();
    // optional closing sequence
    let without_hashes = content.trim_end_matches('#');
    if without_hashes.is_empty() {
        content = "";
    } else if without_hashes.len() < content.len() && without_hashes.ends_with(' ') {
        content = without_hashes.trim_end();
    }
    Some((level, content))
}

fn is_thematic_break(line: &str) -> bool {
    if indent_of(line) > 3 {
        return false;
    }
    let trimmed = line.trim();
    let Some(first) = trimmed.chars().next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_')
        && trimmed.chars().all(|c| c == first || c == ' ')
        && trimmed.chars().filter(|c| *c == first).count() >= 3
}

fn blockquote_line(line: &str) -> Option<&str> {
    if indent_of(line) > 3 {
        return None;
    }
    let rest = line.trim_start().strip_prefix('>')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

fn list_marker(line: &str) -> Option<ListMarker<'_>> {
    let indent = indent_of(line);
    if indent > 3 {
        return None;
    }
    let trimmed = line.trim_start();

    let (ordered, symbol, number, marker_len) = match trimmed.chars().next()? {
        c @ ('-' | '*' | '+') => (false, c, 0, 1),
        c if c.is_ascii_digit() => {
            let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
            if digits > 9 {
                return None;
            }
            let delimiter = trimmed[digits..].chars().next().filter(|c| *c == '.' || *c == ')')?;
            let number = trimmed[..digits].parse().ok()?;
            (true, delimiter, number, digits + 1)
        }
        _ => return None,
    };

    let after = &trimmed[marker_len..];
    let content = if after.is_empty() {
        after
    } else {
        after.strip_prefix(' ')?
    };

    Some(ListMarker {
        ordered,
        symbol,
        number,
        width: indent + marker_len + 1,
        content,
    })
}
