//! # Extensions
//!
//! An [`ExtensionBundle`] is an immutable value holding any subset of
//! capabilities: node types, mark types, commands, paste rules and key
//! bindings. Bundles come from plain factory functions and are composed by
//! [`crate::ManagerBuilder`].

use crate::attachments::FilePasteProps;
use crate::commands::{CommandProps, CommandSpec};
use regex::{Captures, Regex};
use scribe_model::{Attrs, MarkSpec, NodeSpec};
use std::fmt;
use std::sync::Arc;

/// Common priority levels. Higher runs first.
pub mod priority {
    pub const LOWEST: i32 = 0;
    pub const LOW: i32 = 10;
    pub const DEFAULT: i32 = 100;
    pub const MEDIUM: i32 = 1_000;
    pub const HIGH: i32 = 10_000;
    pub const HIGHEST: i32 = 100_000;
    pub const CRITICAL: i32 = 1_000_000;
}

pub type TextAttrsFn = Arc<dyn Fn(&Captures<'_>) -> Option<Attrs> + Send + Sync>;
pub type FilePasteFn = Arc<dyn Fn(&mut FilePasteProps<'_>) -> bool + Send + Sync>;
pub type TextPasteFn = Arc<dyn Fn(&mut CommandProps<'_>, &str) -> bool + Send + Sync>;

/// How pasted content is turned into document edits
#[derive(Clone)]
pub enum PasteRule {
    /// Every match of `pattern` in pasted text gets `mark_type`
    Mark {
        name: String,
        pattern: Regex,
        mark_type: String,
        get_attrs: TextAttrsFn,
    },
    /// Full control over pasted text
    Text { name: String, handler: TextPasteFn },
    /// Pasted or dropped files
    File { name: String, handler: FilePasteFn },
}

impl PasteRule {
    pub fn mark(
        name: impl Into<String>,
        pattern: Regex,
        mark_type: impl Into<String>,
        get_attrs: impl Fn(&Captures<'_>) -> Option<Attrs> + Send + Sync + 'static,
    ) -> Self {
        PasteRule::Mark {
            name: name.into(),
            pattern,
            mark_type: mark_type.into(),
            get_attrs: Arc::new(get_attrs),
        }
    }

    pub fn text(
        name: impl Into<String>,
        handler: impl Fn(&mut CommandProps<'_>, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        PasteRule::Text {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn file(
        name: impl Into<String>,
        handler: impl Fn(&mut FilePasteProps<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        PasteRule::File {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PasteRule::Mark { name, .. } | PasteRule::Text { name, .. } | PasteRule::File { name, .. } => name,
        }
    }
}

impl fmt::Debug for PasteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasteRule::Mark { name, pattern, mark_type, .. } => f
                .debug_struct("Mark")
                .field("name", name)
                .field("pattern", &pattern.as_str())
                .field("mark_type", mark_type)
                .finish(),
            PasteRule::Text { name, .. } => f.debug_struct("Text").field("name", name).finish(),
            PasteRule::File { name, .. } => f.debug_struct("File").field("name", name).finish(),
        }
    }
}

/// A key bound to a command taking no arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: String,
    pub command: String,
}

impl KeyBinding {
    pub fn new(key: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            command: command.into(),
        }
    }
}

/// Everything one extension contributes
#[derive(Debug, Clone)]
pub struct ExtensionBundle {
    pub name: String,
    pub priority: i32,
    pub nodes: Vec<NodeSpec>,
    pub marks: Vec<MarkSpec>,
    pub commands: Vec<CommandSpec>,
    pub paste_rules: Vec<PasteRule>,
    pub keymap: Vec<KeyBinding>,
}

impl ExtensionBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: priority::DEFAULT,
            nodes: Vec::new(),
            marks: Vec::new(),
            commands: Vec::new(),
            paste_rules: Vec::new(),
            keymap: Vec::new(),
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn node(mut self, spec: NodeSpec) -> Self {
        self.nodes.push(spec);
        self
    }

    pub fn mark(mut self, spec: MarkSpec) -> Self {
        self.marks.push(spec);
        self
    }

    pub fn command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }

    pub fn paste_rule(mut self, rule: PasteRule) -> Self {
        self.paste_rules.push(rule);
        self
    }

    pub fn key(mut self, key: &str, command: &str) -> Self {
        self.keymap.push(KeyBinding::new(key, command));
        self
    }
}
