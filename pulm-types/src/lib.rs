//! Shared types for pulm
//!
//! This crate provides common types used across the pulm crates,
//! including note/block identifiers and block change events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Note identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Category identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Block identifier.
///
/// Stored as an opaque string: ids written by older front-ends are short
/// base-36 strings, ids allocated here are hex UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        BlockId(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        BlockId(id)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Block-level change between two versions of a note's block list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BlockChange {
    /// A new block appeared at `index`
    Inserted { block_id: BlockId, index: usize },

    /// A block no longer exists
    Removed { block_id: BlockId, old_index: usize },

    /// A block kept its id but its type or payload changed
    Updated { block_id: BlockId, index: usize },

    /// A block kept its id but changed relative order. A block whose payload
    /// also changed gets an `Updated` entry right after this one.
    Moved {
        block_id: BlockId,
        old_index: usize,
        new_index: usize,
    },
}

impl BlockChange {
    pub fn block_id(&self) -> &BlockId {
        match self {
            BlockChange::Inserted { block_id, .. }
            | BlockChange::Removed { block_id, .. }
            | BlockChange::Updated { block_id, .. }
            | BlockChange::Moved { block_id, .. } => block_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = BlockId::new("a1b2c3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"a1b2c3\"");
    }

    #[test]
    fn change_reports_its_block() {
        let change = BlockChange::Moved {
            block_id: BlockId::from("x"),
            old_index: 0,
            new_index: 2,
        };
        assert_eq!(change.block_id().as_str(), "x");
    }
}
