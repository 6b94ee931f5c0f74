//! # DOM-like elements
//!
//! The editor never talks to a real DOM. Parse rules receive a
//! [`DomElement`] and `to_dom` hooks return one; the text converter uses the
//! same shape for inline HTML and for the HTML fallback of node types that
//! have no native syntax.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Elements that never carry content or a closing tag
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// A single element with flat text content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomElement {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
}

impl DomElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }

    /// Render as a single HTML element
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }

        if self.is_void() {
            out.push_str(" />");
            return out;
        }

        out.push('>');
        out.push_str(&escape_text(&self.text));
        let _ = write!(out, "</{}>", self.tag);
        out
    }

    /// Parse one element at the start of `src`.
    ///
    /// Returns the element and the number of bytes it spans. Nested markup
    /// inside the element is kept as literal text.
    pub fn parse_prefix(src: &str) -> Option<(DomElement, usize)> {
        let mut cursor = Cursor { src, pos: 0 };
        cursor.eat('<')?;

        let tag = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
        if !tag.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }

        let mut element = DomElement::new(tag);
        loop {
            cursor.skip_whitespace();
            if cursor.eat_str("/>") {
                return Some((element, cursor.pos));
            }
            if cursor.eat('>').is_some() {
                break;
            }

            let name = cursor.take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'));
            if name.is_empty() {
                return None;
            }
            cursor.skip_whitespace();

            let value = if cursor.eat('=').is_some() {
                cursor.skip_whitespace();
                cursor.attr_value()?
            } else {
                String::new()
            };
            element.attrs.insert(name.to_ascii_lowercase(), unescape(&value));
        }

        if element.is_void() {
            return Some((element, cursor.pos));
        }

        let rest = &src[cursor.pos..];
        let close = format!("</{}", element.tag);
        let end = rest.to_ascii_lowercase().find(&close)?;
        let after = &rest[end + close.len()..];
        let gt = after.find('>')?;
        if !after[..gt].trim().is_empty() {
            return None;
        }

        element.text = unescape(&rest[..end]);
        Some((element, cursor.pos + end + close.len() + gt + 1))
    }

    /// Parse a string holding exactly one element (surrounding whitespace allowed)
    pub fn parse(src: &str) -> Option<DomElement> {
        let trimmed = src.trim();
        let (element, used) = Self::parse_prefix(trimmed)?;
        (used == trimmed.len()).then_some(element)
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> Option<()> {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Some(())
        } else {
            None
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        if self.src[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &src[start..self.pos]
    }

    fn attr_value(&mut self) -> Option<String> {
        match self.peek()? {
            quote @ ('"' | '\'') => {
                self.pos += 1;
                let start = self.pos;
                let len = self.src[start..].find(quote)?;
                self.pos = start + len + 1;
                Some(self.src[start..start + len].to_string())
            }
            _ => {
                let value = self.take_while(|c| !c.is_whitespace() && c != '>');
                Some(value.to_string())
            }
        }
    }
}

/// A tiny CSS-like selector: `tag`, `tag[attr]`, `tag[attr="value"]`, `[attr]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    tag: Option<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(source: &str) -> Self {
        let tag_end = source.find('[').unwrap_or(source.len());
        let tag = source[..tag_end].trim();
        let mut attrs = Vec::new();

        let mut rest = &source[tag_end..];
        while let Some(open) = rest.find('[') {
            let Some(close) = rest[open..].find(']') else {
                break;
            };
            let body = &rest[open + 1..open + close];
            match body.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                    attrs.push((name.trim().to_string(), Some(value.to_string())));
                }
                None => attrs.push((body.trim().to_string(), None)),
            }
            rest = &rest[open + close + 1..];
        }

        Self {
            source: source.to_string(),
            tag: (!tag.is_empty()).then(|| tag.to_ascii_lowercase()),
            attrs,
        }
    }

    pub fn matches(&self, element: &DomElement) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != element.tag {
                return false;
            }
        }

        self.attrs.iter().all(|(name, expected)| match (element.attr(name), expected) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
