//! # Commands
//!
//! A command is plain data: a name, the argument shape it accepts and a
//! function that edits a transaction.
//!
//! ## Semantics
//!
//! - **Dispatch commits**: a command that returns `true` and called
//!   [`CommandProps::dispatch`] has its transaction committed
//! - **Dry runs**: with dispatch disabled the transaction is thrown away,
//!   so `can` never mutates state
//! - **Preconditions**: a command that cannot apply returns `false`; that
//!   is control flow, not an error
//! - **Arguments**: a mismatch with the declared shape is a programmer
//!   error ([`CommandError::InvalidArguments`])

use crate::errors::CommandError;
use scribe_model::{Attrs, EditorState, Node, Selection, Transaction};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Declared kind of one command argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgKind {
    Position,
    /// A position that may be omitted (trailing) or passed as `None`
    OptionalPosition,
    Integer,
    Text,
    Bool,
    Attrs,
    Node,
}

/// A single argument value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CommandArg {
    Position(usize),
    Integer(i64),
    Text(String),
    Bool(bool),
    Attrs(Attrs),
    Node(Node),
    None,
}

impl CommandArg {
    fn matches(&self, kind: ArgKind) -> bool {
        matches!(
            (kind, self),
            (ArgKind::Position, CommandArg::Position(_))
                | (ArgKind::OptionalPosition, CommandArg::Position(_))
                | (ArgKind::OptionalPosition, CommandArg::None)
                | (ArgKind::Integer, CommandArg::Integer(_))
                | (ArgKind::Text, CommandArg::Text(_))
                | (ArgKind::Bool, CommandArg::Bool(_))
                | (ArgKind::Attrs, CommandArg::Attrs(_))
                | (ArgKind::Node, CommandArg::Node(_))
        )
    }

    fn kind_name(&self) -> &'static str {
        match self {
            CommandArg::Position(_) => "position",
            CommandArg::Integer(_) => "integer",
            CommandArg::Text(_) => "text",
            CommandArg::Bool(_) => "bool",
            CommandArg::Attrs(_) => "attrs",
            CommandArg::Node(_) => "node",
            CommandArg::None => "none",
        }
    }
}

/// Positional arguments for a command call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommandArgs(Vec<CommandArg>);

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, pos: usize) -> Self {
        self.0.push(CommandArg::Position(pos));
        self
    }

    pub fn optional_position(mut self, pos: Option<usize>) -> Self {
        self.0.push(pos.map_or(CommandArg::None, CommandArg::Position));
        self
    }

    pub fn integer(mut self, value: i64) -> Self {
        self.0.push(CommandArg::Integer(value));
        self
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.0.push(CommandArg::Text(value.into()));
        self
    }

    pub fn bool(mut self, value: bool) -> Self {
        self.0.push(CommandArg::Bool(value));
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.0.push(CommandArg::Attrs(attrs));
        self
    }

    pub fn node(mut self, node: Node) -> Self {
        self.0.push(CommandArg::Node(node));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CommandArg> {
        self.0.get(index)
    }

    // Typed accessors. Arguments are checked against the declared shape
    // before a command runs, so a mismatch here reads as absent.

    pub fn position_at(&self, index: usize) -> Option<usize> {
        match self.get(index) {
            Some(CommandArg::Position(pos)) => Some(*pos),
            _ => None,
        }
    }

    pub fn integer_at(&self, index: usize) -> Option<i64> {
        match self.get(index) {
            Some(CommandArg::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn text_at(&self, index: usize) -> Option<&str> {
        match self.get(index) {
            Some(CommandArg::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn bool_at(&self, index: usize) -> Option<bool> {
        match self.get(index) {
            Some(CommandArg::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn attrs_at(&self, index: usize) -> Option<&Attrs> {
        match self.get(index) {
            Some(CommandArg::Attrs(attrs)) => Some(attrs),
            _ => None,
        }
    }

    pub fn node_at(&self, index: usize) -> Option<&Node> {
        match self.get(index) {
            Some(CommandArg::Node(node)) => Some(node),
            _ => None,
        }
    }
}

impl From<Vec<CommandArg>> for CommandArgs {
    fn from(args: Vec<CommandArg>) -> Self {
        Self(args)
    }
}

/// What a running command can see and do
pub struct CommandProps<'a> {
    state: &'a EditorState,
    tr: &'a mut Transaction,
    can_dispatch: bool,
    dispatched: bool,
}

impl<'a> CommandProps<'a> {
    pub(crate) fn new(state: &'a EditorState, tr: &'a mut Transaction, can_dispatch: bool) -> Self {
        Self {
            state,
            tr,
            can_dispatch,
            dispatched: false,
        }
    }

    /// State the command was invoked against. Inside a chain, read
    /// [`Self::tr`]'s document for the latest content.
    pub fn state(&self) -> &EditorState {
        self.state
    }

    pub fn tr(&mut self) -> &mut Transaction {
        &mut *self.tr
    }

    /// Current document, including earlier edits of the same transaction
    pub fn doc(&self) -> &Node {
        self.tr.doc()
    }

    pub fn selection(&self) -> Selection {
        self.tr.selection()
    }

    /// `false` during a dry run
    pub fn can_dispatch(&self) -> bool {
        self.can_dispatch
    }

    /// Ask for the transaction to be committed
    pub fn dispatch(&mut self) {
        if self.can_dispatch {
            self.dispatched = true;
        }
    }

    pub(crate) fn dispatched(&self) -> bool {
        self.dispatched
    }
}

pub type CommandFn = Arc<dyn Fn(&mut CommandProps<'_>, &CommandArgs) -> bool + Send + Sync>;

/// A named command with its argument shape
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub args: Vec<ArgKind>,
    pub run: CommandFn,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        args: Vec<ArgKind>,
        run: impl Fn(&mut CommandProps<'_>, &CommandArgs) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            args,
            run: Arc::new(run),
        }
    }

    /// Check `args` against the declared shape. Trailing optional
    /// positions may be left out.
    pub fn check_args(&self, args: &CommandArgs) -> Result<(), CommandError> {
        if args.len() > self.args.len() {
            return Err(CommandError::invalid_arguments(
                &self.name,
                format!("expected at most {} arguments, got {}", self.args.len(), args.len()),
            ));
        }

        for (index, kind) in self.args.iter().enumerate() {
            match args.get(index) {
                Some(arg) if arg.matches(*kind) => {}
                Some(arg) => {
                    return Err(CommandError::invalid_arguments(
                        &self.name,
                        format!("argument {} should be {:?}, got {}", index, kind, arg.kind_name()),
                    ))
                }
                None if *kind == ArgKind::OptionalPosition => {}
                None => {
                    return Err(CommandError::invalid_arguments(
                        &self.name,
                        format!("missing argument {} ({:?})", index, kind),
                    ))
                }
            }
        }

        Ok(())
    }

    pub(crate) fn invoke(&self, props: &mut CommandProps<'_>, args: &CommandArgs) -> bool {
        (self.run)(props, args)
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}
