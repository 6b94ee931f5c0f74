//! # Scribe Markdown
//!
//! Converts between markdown text and document trees.
//!
//! ## Design
//!
//! - **Schema driven**: the parser only builds node and mark types the
//!   schema declares; everything else stays literal text
//! - **Never fails**: any input produces a valid document
//! - **Stable output**: serializing a parsed document and parsing it again
//!   yields the same tree
//! - **HTML escape hatch**: types without markdown syntax are written with
//!   their `to_dom` HTML and read back through the schema's parse rules
//!
//! ```text
//! "# Title\n\nSome *text*."
//!         │ parse                      ▲ serialize
//!         ▼                            │
//! doc(heading[level=1]("Title"), paragraph("Some ", italic("text"), "."))
//! ```

pub mod names;
pub mod options;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use options::MarkdownOptions;
pub use parser::{parse, MarkdownParser};
pub use serializer::{serialize, serialize_with, MarkdownSerializer};
