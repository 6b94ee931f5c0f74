//! Content expressions: which children a node type accepts.
//!
//! Supported grammar is a space-separated sequence of terms, each a node
//! type name or group name with an optional `*`, `+` or `?` quantifier:
//! `"block+"`, `"inline*"`, `"paragraph block*"`, `""`.

use crate::error::{ModelError, ModelResult};
use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ContentTerm {
    name: String,
    min: usize,
    max: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentExpr {
    source: String,
    terms: Vec<ContentTerm>,
}

impl ContentExpr {
    pub fn parse(source: &str) -> ModelResult<Self> {
        let mut terms = Vec::new();

        for raw in source.split_whitespace() {
            let (name, min, max) = match raw.chars().last() {
                Some('*') => (&raw[..raw.len() - 1], 0, None),
                Some('+') => (&raw[..raw.len() - 1], 1, None),
                Some('?') => (&raw[..raw.len() - 1], 0, Some(1)),
                _ => (raw, 1, Some(1)),
            };

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ModelError::InvalidSchema(format!(
                    "Invalid content expression '{}'",
                    source
                )));
            }

            terms.push(ContentTerm {
                name: name.to_string(),
                min,
                max,
            });
        }

        Ok(Self {
            source: source.trim().to_string(),
            terms,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Leaf types accept no content at all
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Names (types or groups) referenced by this expression
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.name.as_str())
    }

    /// Whether a node of this type/group may appear anywhere in the content
    pub fn allows(&self, type_name: &str, groups: &[String]) -> bool {
        self.terms
            .iter()
            .any(|t| t.name == type_name || groups.iter().any(|g| *g == t.name))
    }

    /// Greedy match of a child list against the expression
    pub fn matches(&self, children: &[Node]) -> bool {
        let mut index = 0;

        for term in &self.terms {
            let mut count = 0;
            while index < children.len() && term.max.map_or(true, |max| count < max) {
                let child_type = children[index].node_type();
                if !(child_type.name() == term.name || child_type.in_group(&term.name)) {
                    break;
                }
                index += 1;
                count += 1;
            }

            if count < term.min {
                return false;
            }
        }

        index == children.len()
    }

    /// Two node declarations are compatible when their content models agree
    pub fn compatible(&self, other: &ContentExpr) -> bool {
        self.terms == other.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantifiers() {
        let expr = ContentExpr::parse("paragraph block*").unwrap();
        assert_eq!(expr.names().collect::<Vec<_>>(), vec!["paragraph", "block"]);
        assert!(!expr.is_empty());

        assert!(ContentExpr::parse("").unwrap().is_empty());
        assert!(ContentExpr::parse("block+ (").is_err());
    }

    #[test]
    fn test_allows_by_group() {
        let expr = ContentExpr::parse("inline*").unwrap();
        assert!(expr.allows("text", &["inline".to_string()]));
        assert!(!expr.allows("paragraph", &["block".to_string()]));
    }

    #[test]
    fn test_compatible_ignores_spacing() {
        let a = ContentExpr::parse("block+").unwrap();
        let b = ContentExpr::parse("  block+ ").unwrap();
        let c = ContentExpr::parse("block*").unwrap();
        assert!(a.compatible(&b));
        assert!(!a.compatible(&c));
    }
}
