//! # Schema
//!
//! Node and mark type declarations plus the rules used to build and
//! validate nodes. A [`Schema`] is immutable once built and cheap to clone.
//!
//! ```text
//! NodeSpec / MarkSpec  ──SchemaBuilder::build──▶  Schema
//!                                                  ├── NodeType (content expr, attr defaults)
//!                                                  ├── MarkType (rank)
//!                                                  └── DOM parse rules (priority ordered)
//! ```

use crate::content::ContentExpr;
use crate::dom::{DomElement, Selector};
use crate::error::{ModelError, ModelResult};
use crate::node::{Mark, Node};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Attribute mapping carried by nodes and marks
pub type Attrs = BTreeMap<String, Value>;

pub type GetAttrs = Arc<dyn Fn(&DomElement) -> Option<Attrs> + Send + Sync>;
pub type NodeToDom = Arc<dyn Fn(&Node) -> DomElement + Send + Sync>;
pub type MarkToDom = Arc<dyn Fn(&Mark, &str) -> DomElement + Send + Sync>;

/// Rule priority used when a parse rule does not set one
pub const DEFAULT_RULE_PRIORITY: i32 = 50;

pub const TEXT_NODE: &str = "text";
pub const DEFAULT_TOP_NODE: &str = "doc";

#[derive(Debug, Clone, PartialEq)]
pub struct AttrSpec {
    /// `None` makes the attribute required
    pub default: Option<Value>,
}

/// Maps a DOM-like element to attributes for a node or mark type
#[derive(Clone)]
pub struct ParseRule {
    selector: Selector,
    priority: i32,
    get_attrs: Option<GetAttrs>,
}

impl ParseRule {
    pub fn tag(selector: &str) -> Self {
        Self {
            selector: Selector::parse(selector),
            priority: DEFAULT_RULE_PRIORITY,
            get_attrs: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn get_attrs(
        mut self,
        get_attrs: impl Fn(&DomElement) -> Option<Attrs> + Send + Sync + 'static,
    ) -> Self {
        self.get_attrs = Some(Arc::new(get_attrs));
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn rule_priority(&self) -> i32 {
        self.priority
    }

    /// Attributes for `element`, or `None` when the rule does not apply
    pub fn attrs_for(&self, element: &DomElement) -> Option<Attrs> {
        if !self.selector.matches(element) {
            return None;
        }

        match &self.get_attrs {
            Some(get_attrs) => get_attrs(element),
            None => Some(Attrs::new()),
        }
    }
}

impl fmt::Debug for ParseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseRule")
            .field("selector", &self.selector.as_str())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Declaration of a node type
#[derive(Clone)]
pub struct NodeSpec {
    pub name: String,
    pub content: String,
    pub group: Option<String>,
    pub inline: bool,
    pub atom: bool,
    pub code: bool,
    pub attrs: BTreeMap<String, AttrSpec>,
    pub parse_rules: Vec<ParseRule>,
    pub to_dom: Option<NodeToDom>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            group: None,
            inline: false,
            atom: false,
            code: false,
            attrs: BTreeMap::new(),
            parse_rules: Vec::new(),
            to_dom: None,
        }
    }

    pub fn content(mut self, expr: &str) -> Self {
        self.content = expr.to_string();
        self
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn code(mut self) -> Self {
        self.code = true;
        self
    }

    pub fn attr(mut self, name: &str, default: Value) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec { default: Some(default) });
        self
    }

    pub fn required_attr(mut self, name: &str) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec { default: None });
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_rules.push(rule);
        self
    }

    pub fn to_dom(mut self, to_dom: impl Fn(&Node) -> DomElement + Send + Sync + 'static) -> Self {
        self.to_dom = Some(Arc::new(to_dom));
        self
    }
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("name", &self.name)
            .field("content", &self.content)
            .field("group", &self.group)
            .field("inline", &self.inline)
            .field("atom", &self.atom)
            .field("attrs", &self.attrs.keys().collect::<Vec<_>>())
            .field("parse_rules", &self.parse_rules)
            .finish()
    }
}

/// Declaration of a mark type
#[derive(Clone)]
pub struct MarkSpec {
    pub name: String,
    pub attrs: BTreeMap<String, AttrSpec>,
    pub parse_rules: Vec<ParseRule>,
    pub to_dom: Option<MarkToDom>,
}

impl MarkSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: BTreeMap::new(),
            parse_rules: Vec::new(),
            to_dom: None,
        }
    }

    pub fn attr(mut self, name: &str, default: Value) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec { default: Some(default) });
        self
    }

    pub fn required_attr(mut self, name: &str) -> Self {
        self.attrs.insert(name.to_string(), AttrSpec { default: None });
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_rules.push(rule);
        self
    }

    pub fn to_dom(
        mut self,
        to_dom: impl Fn(&Mark, &str) -> DomElement + Send + Sync + 'static,
    ) -> Self {
        self.to_dom = Some(Arc::new(to_dom));
        self
    }
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("name", &self.name)
            .field("attrs", &self.attrs.keys().collect::<Vec<_>>())
            .field("parse_rules", &self.parse_rules)
            .finish()
    }
}

fn compute_attrs(
    type_name: &str,
    specs: &BTreeMap<String, AttrSpec>,
    given: &Attrs,
) -> ModelResult<Attrs> {
    let mut attrs = Attrs::new();
    for (name, spec) in specs {
        let value = match given.get(name) {
            Some(value) => value.clone(),
            None => spec.default.clone().ok_or_else(|| ModelError::MissingAttribute {
                node_type: type_name.to_string(),
                attr: name.clone(),
            })?,
        };
        attrs.insert(name.clone(), value);
    }
    Ok(attrs)
}

struct NodeTypeData {
    spec: NodeSpec,
    content: ContentExpr,
    groups: Vec<String>,
}

/// A node type inside a built schema
#[derive(Clone)]
pub struct NodeType(Arc<NodeTypeData>);

impl NodeType {
    fn new(spec: NodeSpec) -> ModelResult<Self> {
        let content = ContentExpr::parse(&spec.content)?;
        let groups = spec
            .group
            .as_deref()
            .map(|g| g.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self(Arc::new(NodeTypeData { spec, content, groups })))
    }

    pub fn name(&self) -> &str {
        &self.0.spec.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.0.spec
    }

    pub fn content_expr(&self) -> &ContentExpr {
        &self.0.content
    }

    pub fn groups(&self) -> &[String] {
        &self.0.groups
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.0.groups.iter().any(|g| g == group)
    }

    pub fn is_text(&self) -> bool {
        self.name() == TEXT_NODE
    }

    pub fn is_inline(&self) -> bool {
        self.0.spec.inline || self.is_text()
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.content.is_empty()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.0.spec.atom
    }

    pub fn is_code(&self) -> bool {
        self.0.spec.code
    }

    /// Block type whose content is inline
    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.0.content.names().any(|n| n == "inline" || n == TEXT_NODE)
    }

    /// Whether a node of `other` type may appear in this type's content
    pub fn allows_child(&self, other: &NodeType) -> bool {
        self.0.content.allows(other.name(), other.groups())
    }

    pub fn valid_content(&self, children: &[Node]) -> bool {
        self.0.content.matches(children)
    }

    /// Fill defaults and check required attributes; unknown keys are dropped
    pub fn compute_attrs(&self, given: &Attrs) -> ModelResult<Attrs> {
        compute_attrs(self.name(), &self.0.spec.attrs, given)
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.name() == other.name()
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.name())
    }
}

struct MarkTypeData {
    spec: MarkSpec,
    rank: usize,
}

/// A mark type inside a built schema; `rank` fixes mark ordering in sets
#[derive(Clone)]
pub struct MarkType(Arc<MarkTypeData>);

impl MarkType {
    pub fn name(&self) -> &str {
        &self.0.spec.name
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.0.spec
    }

    pub fn rank(&self) -> usize {
        self.0.rank
    }

    pub fn compute_attrs(&self, given: &Attrs) -> ModelResult<Attrs> {
        compute_attrs(self.name(), &self.0.spec.attrs, given)
    }

    pub fn create(&self, attrs: &Attrs) -> ModelResult<Mark> {
        Ok(Mark::new(self.clone(), self.compute_attrs(attrs)?))
    }
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.name() == other.name()
    }
}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.name())
    }
}

#[derive(Debug, Clone)]
pub enum RuleTarget {
    Node(NodeType),
    Mark(MarkType),
}

/// A parse rule bound to the type it produces
#[derive(Debug, Clone)]
pub struct DomRule {
    pub target: RuleTarget,
    pub rule: ParseRule,
}

/// Result of matching an element against the schema's parse rules
#[derive(Debug, Clone)]
pub enum DomMatch {
    Node(NodeType, Attrs),
    Mark(MarkType, Attrs),
}

enum Declaration {
    Node(NodeSpec),
    Mark(MarkSpec),
}

/// Collects declarations; parse rules keep declaration order as tie-breaker
#[derive(Default)]
pub struct SchemaBuilder {
    declarations: Vec<Declaration>,
    top_node: Option<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.add_node(spec);
        self
    }

    pub fn mark(mut self, spec: MarkSpec) -> Self {
        self.add_mark(spec);
        self
    }

    pub fn top_node(mut self, name: &str) -> Self {
        self.top_node = Some(name.to_string());
        self
    }

    pub fn add_node(&mut self, spec: NodeSpec) {
        self.declarations.push(Declaration::Node(spec));
    }

    pub fn add_mark(&mut self, spec: MarkSpec) {
        self.declarations.push(Declaration::Mark(spec));
    }

    pub fn build(self) -> ModelResult<Schema> {
        let mut nodes = Vec::new();
        let mut marks = Vec::new();
        let mut node_index = HashMap::new();
        let mut mark_index = HashMap::new();
        let mut dom_rules = Vec::new();

        for declaration in self.declarations {
            match declaration {
                Declaration::Node(spec) => {
                    if node_index.contains_key(&spec.name) {
                        return Err(ModelError::InvalidSchema(format!(
                            "Duplicate node type '{}'",
                            spec.name
                        )));
                    }
                    let node_type = NodeType::new(spec)?;
                    for rule in &node_type.spec().parse_rules {
                        dom_rules.push(DomRule {
                            target: RuleTarget::Node(node_type.clone()),
                            rule: rule.clone(),
                        });
                    }
                    node_index.insert(node_type.name().to_string(), nodes.len());
                    nodes.push(node_type);
                }
                Declaration::Mark(spec) => {
                    if mark_index.contains_key(&spec.name) {
                        return Err(ModelError::InvalidSchema(format!(
                            "Duplicate mark type '{}'",
                            spec.name
                        )));
                    }
                    let mark_type = MarkType(Arc::new(MarkTypeData {
                        spec,
                        rank: marks.len(),
                    }));
                    for rule in &mark_type.spec().parse_rules {
                        dom_rules.push(DomRule {
                            target: RuleTarget::Mark(mark_type.clone()),
                            rule: rule.clone(),
                        });
                    }
                    mark_index.insert(mark_type.name().to_string(), marks.len());
                    marks.push(mark_type);
                }
            }
        }

        let top_node = self.top_node.unwrap_or_else(|| DEFAULT_TOP_NODE.to_string());
        if !node_index.contains_key(&top_node) {
            return Err(ModelError::InvalidSchema(format!(
                "Schema is missing its top node type '{}'",
                top_node
            )));
        }
        if !node_index.contains_key(TEXT_NODE) {
            return Err(ModelError::InvalidSchema(
                "Schema is missing the 'text' node type".to_string(),
            ));
        }

        for node_type in &nodes {
            for name in node_type.content_expr().names() {
                let known = node_index.contains_key(name)
                    || nodes.iter().any(|n: &NodeType| n.in_group(name));
                if !known {
                    return Err(ModelError::InvalidSchema(format!(
                        "Content of '{}' refers to unknown type or group '{}'",
                        node_type.name(),
                        name
                    )));
                }
            }
        }

        // Stable: equal priorities keep declaration (extension) order
        dom_rules.sort_by(|a, b| b.rule.rule_priority().cmp(&a.rule.rule_priority()));

        Ok(Schema(Arc::new(SchemaData {
            nodes,
            marks,
            node_index,
            mark_index,
            top_node,
            dom_rules,
        })))
    }
}

struct SchemaData {
    nodes: Vec<NodeType>,
    marks: Vec<MarkType>,
    node_index: HashMap<String, usize>,
    mark_index: HashMap<String, usize>,
    top_node: String,
    dom_rules: Vec<DomRule>,
}

#[derive(Clone)]
pub struct Schema(Arc<SchemaData>);

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn node_type(&self, name: &str) -> ModelResult<&NodeType> {
        self.0
            .node_index
            .get(name)
            .map(|&i| &self.0.nodes[i])
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.0.node_index.contains_key(name)
    }

    pub fn mark_type(&self, name: &str) -> ModelResult<&MarkType> {
        self.0
            .mark_index
            .get(name)
            .map(|&i| &self.0.marks[i])
            .ok_or_else(|| ModelError::UnknownMarkType(name.to_string()))
    }

    pub fn has_mark(&self, name: &str) -> bool {
        self.0.mark_index.contains_key(name)
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.0.nodes
    }

    pub fn mark_types(&self) -> &[MarkType] {
        &self.0.marks
    }

    pub fn top_node_type(&self) -> &NodeType {
        &self.0.nodes[self.0.node_index[&self.0.top_node]]
    }

    pub fn text_type(&self) -> &NodeType {
        &self.0.nodes[self.0.node_index[TEXT_NODE]]
    }

    /// Create a validated node: attributes get defaults, content must match
    pub fn node(&self, type_name: &str, attrs: Attrs, content: Vec<Node>) -> ModelResult<Node> {
        let node_type = self.node_type(type_name)?;
        if node_type.is_text() {
            return Err(ModelError::invalid_content(
                TEXT_NODE,
                "use Schema::text to create text nodes",
            ));
        }

        let attrs = node_type.compute_attrs(&attrs)?;
        let content = crate::node::normalize(content);
        if !node_type.valid_content(&content) {
            return Err(ModelError::invalid_content(
                type_name,
                format!(
                    "children [{}] do not match '{}'",
                    content
                        .iter()
                        .map(|c| c.type_name().to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    node_type.content_expr().as_str()
                ),
            ));
        }

        Ok(Node::new_branch(node_type.clone(), attrs, content, Vec::new()))
    }

    /// Top node holding `content` without content validation. Converters
    /// use it as the last fallback when they must always return a document.
    pub fn top_node_unchecked(&self, content: Vec<Node>) -> Node {
        let node_type = self.top_node_type().clone();
        let attrs = node_type.compute_attrs(&Attrs::new()).unwrap_or_default();
        Node::new_branch(node_type, attrs, crate::node::normalize(content), Vec::new())
    }

    pub fn text(&self, text: impl Into<String>) -> Node {
        Node::new_text(self.text_type().clone(), text.into(), Vec::new())
    }

    pub fn text_with_marks(&self, text: impl Into<String>, marks: Vec<Mark>) -> Node {
        let mut set = Vec::new();
        for mark in marks {
            set = mark.add_to_set(&set);
        }
        Node::new_text(self.text_type().clone(), text.into(), set)
    }

    pub fn mark(&self, name: &str, attrs: Attrs) -> ModelResult<Mark> {
        self.mark_type(name)?.create(&attrs)
    }

    /// Parse rules in the order they are consulted
    pub fn dom_rules(&self) -> &[DomRule] {
        &self.0.dom_rules
    }

    /// First rule that accepts `element` wins
    pub fn match_dom(&self, element: &DomElement) -> Option<DomMatch> {
        self.0.dom_rules.iter().find_map(|dom_rule| {
            let attrs = dom_rule.rule.attrs_for(element)?;
            match &dom_rule.target {
                RuleTarget::Node(node_type) => {
                    let attrs = node_type.compute_attrs(&attrs).ok()?;
                    Some(DomMatch::Node(node_type.clone(), attrs))
                }
                RuleTarget::Mark(mark_type) => {
                    let attrs = mark_type.compute_attrs(&attrs).ok()?;
                    Some(DomMatch::Mark(mark_type.clone(), attrs))
                }
            }
        })
    }

    /// Build a node from its JSON object form
    pub fn node_from_json(&self, value: &Value) -> ModelResult<Node> {
        let object = value
            .as_object()
            .ok_or_else(|| ModelError::invalid_json("node must be an object"))?;
        let type_name = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::invalid_json("node is missing 'type'"))?;

        let marks = match object.get("marks") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|m| self.mark_from_json(m))
                .collect::<ModelResult<Vec<_>>>()?,
            Some(_) => return Err(ModelError::invalid_json("'marks' must be an array")),
            None => Vec::new(),
        };

        if type_name == TEXT_NODE {
            let text = object
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ModelError::invalid_json("text node is missing 'text'"))?;
            if text.is_empty() {
                return Err(ModelError::invalid_json("empty text nodes are not allowed"));
            }
            return Ok(self.text_with_marks(text, marks));
        }

        let attrs = json_attrs(object.get("attrs"))?;
        let content = match object.get("content") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|c| self.node_from_json(c))
                .collect::<ModelResult<Vec<_>>>()?,
            Some(_) => return Err(ModelError::invalid_json("'content' must be an array")),
            None => Vec::new(),
        };

        let node = self.node(type_name, attrs, content)?;
        Ok(if marks.is_empty() { node } else { node.with_marks(marks) })
    }

    pub fn mark_from_json(&self, value: &Value) -> ModelResult<Mark> {
        let type_name = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::invalid_json("mark is missing 'type'"))?;
        self.mark(type_name, json_attrs(value.get("attrs"))?)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("nodes", &self.0.nodes)
            .field("marks", &self.0.marks)
            .field("top_node", &self.0.top_node)
            .finish()
    }
}

fn json_attrs(value: Option<&Value>) -> ModelResult<Attrs> {
    match value {
        None | Some(Value::Null) => Ok(Attrs::new()),
        Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Some(_) => Err(ModelError::invalid_json("'attrs' must be an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::basic_schema;
    use serde_json::json;

    #[test]
    fn test_builder_requires_top_and_text() {
        let result = Schema::builder()
            .node(NodeSpec::new("text").group("inline"))
            .build();
        assert!(matches!(result, Err(ModelError::InvalidSchema(_))));

        let result = Schema::builder()
            .node(NodeSpec::new("doc").content("block+"))
            .build();
        assert!(matches!(result, Err(ModelError::InvalidSchema(_))));
    }

    #[test]
    fn test_builder_rejects_unknown_content_names() {
        let result = Schema::builder()
            .node(NodeSpec::new("doc").content("section+"))
            .node(NodeSpec::new("text").group("inline"))
            .build();
        assert!(matches!(result, Err(ModelError::InvalidSchema(_))));
    }

    #[test]
    fn test_node_fills_defaults_and_checks_required() {
        let schema = basic_schema();

        let heading = schema
            .node("heading", Attrs::new(), vec![schema.text("Hi")])
            .unwrap();
        assert_eq!(heading.attr("level"), Some(&json!(1)));

        let missing = schema.node("image", Attrs::new(), vec![]);
        assert!(matches!(missing, Err(ModelError::MissingAttribute { .. })));
    }

    #[test]
    fn test_node_rejects_invalid_content() {
        let schema = basic_schema();
        let para = schema.node("paragraph", Attrs::new(), vec![]).unwrap();

        // doc requires block+
        assert!(schema.node("doc", Attrs::new(), vec![]).is_err());
        // paragraph only holds inline content
        assert!(schema.node("paragraph", Attrs::new(), vec![para]).is_err());
    }

    #[test]
    fn test_text_node_classification() {
        let schema = basic_schema();
        assert!(schema.node_type("paragraph").unwrap().is_textblock());
        assert!(!schema.node_type("doc").unwrap().is_textblock());
        assert!(schema.node_type("horizontal_rule").unwrap().is_leaf());
        assert!(schema.text_type().is_inline());
    }

    #[test]
    fn test_match_dom_uses_rule_priority() {
        let schema = Schema::builder()
            .node(NodeSpec::new("doc").content("block+"))
            .node(NodeSpec::new("paragraph").content("inline*").group("block"))
            .node(NodeSpec::new("text").group("inline"))
            .mark(
                MarkSpec::new("link")
                    .required_attr("href")
                    .parse_rule(ParseRule::tag("a[href]").get_attrs(|el| {
                        let mut attrs = Attrs::new();
                        attrs.insert("href".into(), json!(el.attr("href")?));
                        Some(attrs)
                    })),
            )
            .node(
                NodeSpec::new("file")
                    .group("block")
                    .atom()
                    .attr("url", json!(""))
                    .parse_rule(
                        ParseRule::tag(r#"a[data-attachment="1"]"#)
                            .priority(60)
                            .get_attrs(|el| {
                                let mut attrs = Attrs::new();
                                attrs.insert("url".into(), json!(el.attr("href").unwrap_or("")));
                                Some(attrs)
                            }),
                    ),
            )
            .build()
            .unwrap();

        let attachment = DomElement::new("a")
            .with_attr("href", "u")
            .with_attr("data-attachment", "1");
        match schema.match_dom(&attachment) {
            Some(DomMatch::Node(node_type, attrs)) => {
                assert_eq!(node_type.name(), "file");
                assert_eq!(attrs["url"], json!("u"));
            }
            other => panic!("expected file node, got {:?}", other),
        }

        let link = DomElement::new("a").with_attr("href", "u");
        assert!(matches!(schema.match_dom(&link), Some(DomMatch::Mark(..))));
    }

    #[test]
    fn test_json_round_trip() {
        let schema = basic_schema();
        let bold = schema.mark("bold", Attrs::new()).unwrap();
        let doc = schema
            .node(
                "doc",
                Attrs::new(),
                vec![schema
                    .node(
                        "paragraph",
                        Attrs::new(),
                        vec![
                            schema.text("plain "),
                            schema.text_with_marks("strong", vec![bold]),
                        ],
                    )
                    .unwrap()],
            )
            .unwrap();

        let json = doc.to_json();
        assert_eq!(json["content"][0]["content"][1]["marks"][0]["type"], "bold");

        let back = schema.node_from_json(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_node_from_json_rejects_garbage() {
        let schema = basic_schema();
        assert!(schema.node_from_json(&json!("doc")).is_err());
        assert!(schema.node_from_json(&json!({"type": "nope"})).is_err());
        assert!(schema
            .node_from_json(&json!({"type": "doc", "content": [{"type": "text", "text": ""}]}))
            .is_err());
    }
}
