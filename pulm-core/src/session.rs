//! Editing session over a single note.
//!
//! Opening converts the note forward once. Each settle (a debounced edit)
//! converts the editor's tree back, diffs it against the stored blocks and
//! replaces them when anything changed. The id allocator lives for the whole
//! session so an id issued by one settle is never issued again by a later one.
//! Nodes that arrive without an id get one, and the settle hands back a tree
//! carrying it; the editor must swap that tree in or the next settle will see
//! the same node as new again.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pulm_types::{BlockChange, BlockId};

use crate::config::ConvertConfig;
use crate::convert::{collect_ids, ForwardConverter, MentionSource, ReverseConverter};
use crate::diagnostics::{Converted, Diagnostic};
use crate::diff::diff_blocks;
use crate::error::Result;
use crate::ids::IdAllocator;
use crate::models::Note;
use crate::schema::DocNode;

/// Result of settling one edit
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settled {
    pub changes: Vec<BlockChange>,
    pub diagnostics: Vec<Diagnostic>,
    /// Ids given to nodes that had none or repeated another node's id
    pub assigned: Vec<BlockId>,
    /// The settled blocks as a tree, present when `assigned` is not empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocNode>,
}

impl Settled {
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

#[derive(Debug)]
pub struct EditSession {
    note: Note,
    config: ConvertConfig,
    allocator: IdAllocator,
}

impl EditSession {
    /// Open `note` for editing and build the tree to show.
    pub fn open(
        mut note: Note,
        config: &ConvertConfig,
        mentions: Option<&dyn MentionSource>,
        now: DateTime<Utc>,
    ) -> (Self, Converted<DocNode>) {
        let mut allocator = IdAllocator::new(&config.ids);
        allocator.observe_all(note.blocks.iter().map(|b| &b.id));
        note.mark_opened(now);

        let mut forward = ForwardConverter::new(config);
        if let Some(source) = mentions {
            forward = forward.with_mentions(source);
        }
        let doc = forward.convert(&note.blocks);

        tracing::info!(
            note = %note.id,
            blocks = note.blocks.len(),
            diagnostics = doc.diagnostics.len(),
            "opened note"
        );
        let session = Self {
            note,
            config: config.clone(),
            allocator,
        };
        (session, doc)
    }

    /// Apply the editor's current tree to the note.
    pub fn settle(&mut self, doc: &DocNode, now: DateTime<Utc>) -> Result<Settled> {
        let (blocks, diagnostics) = ReverseConverter::new(&mut self.allocator)
            .convert(doc)?
            .into_parts();
        let changes = diff_blocks(&self.note.blocks, &blocks);

        let mut carried = Vec::new();
        collect_ids(doc, &mut carried);
        let carried: HashSet<BlockId> = carried.into_iter().collect();
        let assigned: Vec<BlockId> = blocks
            .iter()
            .map(|b| &b.id)
            .filter(|id| !carried.contains(*id))
            .cloned()
            .collect();
        let resolved = (!assigned.is_empty())
            .then(|| ForwardConverter::new(&self.config).convert(&blocks).value);

        if !changes.is_empty() {
            self.note.replace_blocks(blocks, now);
        }

        tracing::debug!(
            note = %self.note.id,
            changes = changes.len(),
            assigned = assigned.len(),
            diagnostics = diagnostics.len(),
            "settled edit"
        );
        Ok(Settled {
            changes,
            diagnostics,
            assigned,
            doc: resolved,
        })
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn into_note(self) -> Note {
        self.note
    }
}
