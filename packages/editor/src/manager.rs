//! # Extension Registry
//!
//! Composes extension bundles into one immutable [`Manager`].
//!
//! ## Design
//!
//! - **Priority order**: bundles are stable-sorted by priority, highest
//!   first; ties keep registration order
//! - **One schema**: node and mark types from every bundle are merged. A
//!   repeated node type must have a compatible content model (same content
//!   expression, group and inline flag); the higher-priority declaration
//!   wins and the lower one only fills in missing attributes, parse rules
//!   and `to_dom`
//! - **Flat command namespace**: a repeated command name is an error
//! - **Ordered rules**: paste rules and key bindings keep priority order;
//!   DOM parse rules are ordered by rule priority, then extension priority
//! - **Pure**: building does no IO and starts no timers

use crate::commands::CommandSpec;
use crate::errors::RegistryError;
use crate::extension::{ExtensionBundle, PasteRule};
use scribe_model::content::ContentExpr;
use scribe_model::schema::DEFAULT_TOP_NODE;
use scribe_model::{MarkSpec, NodeSpec, Schema};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Collects bundles before building a [`Manager`]
#[derive(Debug, Default)]
pub struct ManagerBuilder {
    entries: Vec<(i32, ExtensionBundle)>,
    top_node: Option<String>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bundle at its own priority
    pub fn add(mut self, bundle: ExtensionBundle) -> Self {
        self.entries.push((bundle.priority, bundle));
        self
    }

    /// Register a bundle at an overridden priority
    pub fn add_with_priority(mut self, priority: i32, bundle: ExtensionBundle) -> Self {
        self.entries.push((priority, bundle));
        self
    }

    pub fn extend(mut self, bundles: impl IntoIterator<Item = ExtensionBundle>) -> Self {
        self.entries
            .extend(bundles.into_iter().map(|bundle| (bundle.priority, bundle)));
        self
    }

    pub fn top_node(mut self, name: &str) -> Self {
        self.top_node = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<Manager, RegistryError> {
        let mut entries = self.entries;
        entries.sort_by_key(|(priority, _)| Reverse(*priority));

        let mut nodes: Vec<NodeSpec> = Vec::new();
        let mut marks: Vec<MarkSpec> = Vec::new();
        let mut commands: BTreeMap<String, CommandSpec> = BTreeMap::new();
        let mut paste_rules: Vec<PasteRule> = Vec::new();
        let mut keymap: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (priority, bundle) in &entries {
            debug!(extension = %bundle.name, priority, "registering extension");

            for spec in &bundle.nodes {
                merge_node(&mut nodes, spec)?;
            }
            for spec in &bundle.marks {
                merge_mark(&mut marks, spec)?;
            }
            for command in &bundle.commands {
                if commands.contains_key(&command.name) {
                    return Err(RegistryError::CommandNameConflict(command.name.clone()));
                }
                commands.insert(command.name.clone(), command.clone());
            }
            paste_rules.extend(bundle.paste_rules.iter().cloned());
            for binding in &bundle.keymap {
                keymap
                    .entry(binding.key.clone())
                    .or_default()
                    .push(binding.command.clone());
            }
        }

        let mut builder = Schema::builder();
        for spec in nodes {
            builder.add_node(spec);
        }
        for spec in marks {
            builder.add_mark(spec);
        }
        let schema = builder
            .top_node(self.top_node.as_deref().unwrap_or(DEFAULT_TOP_NODE))
            .build()?;

        info!(
            extensions = entries.len(),
            nodes = schema.node_types().len(),
            marks = schema.mark_types().len(),
            commands = commands.len(),
            "built extension manager"
        );

        Ok(Manager(Arc::new(ManagerInner {
            schema,
            extensions: entries.into_iter().map(|(_, bundle)| bundle.name).collect(),
            commands,
            paste_rules,
            keymap,
        })))
    }
}

fn merge_node(nodes: &mut Vec<NodeSpec>, incoming: &NodeSpec) -> Result<(), RegistryError> {
    let Some(existing) = nodes.iter_mut().find(|n| n.name == incoming.name) else {
        nodes.push(incoming.clone());
        return Ok(());
    };

    let conflict = |reason: String| RegistryError::SchemaConflict {
        name: incoming.name.clone(),
        reason,
    };

    let ours = ContentExpr::parse(&existing.content)?;
    let theirs = ContentExpr::parse(&incoming.content)?;
    if !ours.compatible(&theirs) {
        return Err(conflict(format!(
            "content '{}' vs '{}'",
            existing.content, incoming.content
        )));
    }
    if existing.group != incoming.group {
        return Err(conflict(format!(
            "group {:?} vs {:?}",
            existing.group, incoming.group
        )));
    }
    if existing.inline != incoming.inline {
        return Err(conflict("inline flag differs".to_string()));
    }

    for (name, attr) in &incoming.attrs {
        existing.attrs.entry(name.clone()).or_insert_with(|| attr.clone());
    }
    existing.parse_rules.extend(incoming.parse_rules.iter().cloned());
    if existing.to_dom.is_none() {
        existing.to_dom = incoming.to_dom.clone();
    }
    debug!(node = %incoming.name, "merged compatible node declaration");
    Ok(())
}

/// Marks merge like nodes. An attribute must be required in both
/// declarations or in neither, and a later declaration cannot introduce a
/// required attribute.
fn merge_mark(marks: &mut Vec<MarkSpec>, incoming: &MarkSpec) -> Result<(), RegistryError> {
    let Some(existing) = marks.iter_mut().find(|m| m.name == incoming.name) else {
        marks.push(incoming.clone());
        return Ok(());
    };

    for (name, attr) in &incoming.attrs {
        let required = attr.default.is_none();
        let conflicts = match existing.attrs.get(name) {
            Some(ours) => ours.default.is_none() != required,
            None => required,
        };
        if conflicts {
            return Err(RegistryError::SchemaConflict {
                name: incoming.name.clone(),
                reason: format!("attribute '{}' is required in only one declaration", name),
            });
        }
    }

    for (name, attr) in &incoming.attrs {
        existing.attrs.entry(name.clone()).or_insert_with(|| attr.clone());
    }
    existing.parse_rules.extend(incoming.parse_rules.iter().cloned());
    if existing.to_dom.is_none() {
        existing.to_dom = incoming.to_dom.clone();
    }
    debug!(mark = %incoming.name, "merged compatible mark declaration");
    Ok(())
}

struct ManagerInner {
    schema: Schema,
    extensions: Vec<String>,
    commands: BTreeMap<String, CommandSpec>,
    paste_rules: Vec<PasteRule>,
    keymap: BTreeMap<String, Vec<String>>,
}

/// The composed, immutable result of registering extensions. Cheap to clone.
#[derive(Clone)]
pub struct Manager(Arc<ManagerInner>);

impl Manager {
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    /// Extension names, highest priority first
    pub fn extension_names(&self) -> &[String] {
        &self.0.extensions
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.0.extensions.iter().any(|e| e == name)
    }

    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.0.commands.get(name)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.0.commands.keys().map(String::as_str)
    }

    /// Paste rules in the order they are consulted
    pub fn paste_rules(&self) -> &[PasteRule] {
        &self.0.paste_rules
    }

    /// Commands bound to `key`, in the order they are tried
    pub fn bindings(&self, key: &str) -> &[String] {
        self.0.keymap.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("extensions", &self.0.extensions)
            .field("commands", &self.0.commands.keys().collect::<Vec<_>>())
            .field("paste_rules", &self.0.paste_rules)
            .finish()
    }
}
