//! # Scribe Model
//!
//! Immutable document trees for the scribe editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ schema: node/mark types, parse rules        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ node: Arc-shared tree, positions, JSON form │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ transform + transaction: steps, mappings    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ state: versioned document + undo history    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_model::{EditorState, Schema};
//!
//! let state = EditorState::create(schema.clone(), doc);
//! let mut tr = state.tr();
//! tr.insert_text(1, "Hello")?;
//! let next = state.apply(&tr)?;
//! ```

pub mod content;
pub mod dom;
pub mod error;
pub mod history;
pub mod id_generator;
pub mod node;
pub mod schema;
pub mod state;
pub mod transaction;
pub mod transform;

#[cfg(test)]
mod test_support;

pub use dom::{DomElement, Selector};
pub use error::{ModelError, ModelResult, StepError};
pub use history::{History, HistoryEntry};
pub use id_generator::IdGenerator;
pub use node::{find_children, Mark, Node, NodeWithPos, ResolvedPos};
pub use schema::{
    AttrSpec, Attrs, DomMatch, MarkSpec, MarkType, NodeSpec, NodeType, ParseRule, Schema,
    SchemaBuilder,
};
pub use state::EditorState;
pub use transaction::{Origin, Selection, Transaction};
pub use transform::{MapResult, Mapping, Step, StepMap};
