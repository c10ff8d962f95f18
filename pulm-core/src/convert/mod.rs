//! Block list ⇄ document tree conversion.
//!
//! [`ForwardConverter`] builds the tree an editing surface renders from a
//! note's blocks; [`ReverseConverter`] flattens an edited tree back into
//! blocks. Both are pure: configuration and the mention lookup are passed in,
//! malformed input is repaired and reported as diagnostics.

mod forward;
mod reverse;

use std::collections::HashMap;

use pulm_types::NoteId;

use crate::config::ConvertConfig;
use crate::diagnostics::Converted;
use crate::error::Result;
use crate::ids::IdAllocator;
use crate::models::{Block, Note};
use crate::schema::DocNode;

pub use forward::ForwardConverter;
pub use reverse::ReverseConverter;
pub(crate) use reverse::collect_ids;

/// Lookup of mention targets, used to flag orphaned and stale mentions
pub trait MentionSource {
    /// Current title of a note, `None` when the note does not exist
    fn note_title(&self, note_id: &NoteId) -> Option<&str>;
}

impl MentionSource for HashMap<NoteId, String> {
    fn note_title(&self, note_id: &NoteId) -> Option<&str> {
        self.get(note_id).map(String::as_str)
    }
}

impl MentionSource for [Note] {
    fn note_title(&self, note_id: &NoteId) -> Option<&str> {
        self.iter()
            .find(|n| &n.id == note_id && !n.is_deleted)
            .map(|n| n.title.as_str())
    }
}

impl MentionSource for Vec<Note> {
    fn note_title(&self, note_id: &NoteId) -> Option<&str> {
        self.as_slice().note_title(note_id)
    }
}

/// Forward conversion with default settings and no mention lookup
pub fn blocks_to_doc(blocks: &[Block]) -> Converted<DocNode> {
    let config = ConvertConfig::default();
    ForwardConverter::new(&config).convert(blocks)
}

/// Reverse conversion; `allocator` should have seen every id of the note
pub fn doc_to_blocks(doc: &DocNode, allocator: &mut IdAllocator) -> Result<Converted<Vec<Block>>> {
    ReverseConverter::new(allocator).convert(doc)
}
