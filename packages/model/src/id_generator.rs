//! Node identifiers of the form `"{seed}-{n}"`.
//!
//! The seed is a CRC32 of the editor's instance label, so every editor
//! created with the same label hands out ids from the same namespace. A
//! generator must therefore learn the ids already present in a loaded
//! document ([`IdGenerator::observe_doc`]) before it creates new ones.

use crate::node::Node;
use crc32fast::Hasher;

/// Attribute holding a node's identifier
pub const ID_ATTR: &str = "id";

/// Stable eight-digit hex seed for an instance label
pub fn instance_seed(label: &str) -> String {
    let label = label.strip_prefix("scribe://").unwrap_or(label);
    let mut hasher = Hasher::new();
    hasher.update(b"scribe://");
    hasher.update(label.as_bytes());
    format!("{:08x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    /// Highest counter handed out or seen in a document
    last: u64,
}

impl IdGenerator {
    pub fn new(label: &str) -> Self {
        Self::from_seed(instance_seed(label))
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            last: 0,
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Note an identifier that already exists. Ids from another seed are
    /// ignored since they can never collide with ours.
    pub fn observe(&mut self, id: &str) {
        let counter = id
            .strip_prefix(self.seed.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(n) = counter {
            self.last = self.last.max(n);
        }
    }

    /// Note every `id` attribute in `doc`
    pub fn observe_doc(&mut self, doc: &Node) {
        doc.descendants(|node, _| {
            if let Some(id) = node.attr_str(ID_ATTR) {
                self.observe(id);
            }
            true
        });
    }

    /// Next identifier, greater than anything observed so far
    pub fn new_id(&mut self) -> String {
        self.last += 1;
        format!("{}-{}", self.seed, self.last)
    }
}
