//! Apply an edited document tree to a note.

use anyhow::{Context, Result};
use pulm_core::{decode_note, BlockChange, ConvertConfig, DocNode, EditSession, IdAllocator};
use std::path::Path;

use super::{print_diagnostics, read_json, write_json};

pub fn save_note(
    config: &ConvertConfig,
    note_path: &Path,
    doc_path: &Path,
    out: Option<&Path>,
    doc_out: Option<&Path>,
) -> Result<()> {
    let mut ids = IdAllocator::new(&config.ids);
    let (note, decode_diagnostics) = decode_note(&read_json(note_path)?, &mut ids)
        .with_context(|| format!("Failed to read note {}", note_path.display()))?
        .into_parts();
    let doc: DocNode = serde_json::from_value(read_json(doc_path)?)
        .with_context(|| format!("{} is not a document tree", doc_path.display()))?;

    let now = chrono::Utc::now();
    let (mut session, _) = EditSession::open(note, config, None, now);
    let settled = session
        .settle(&doc, now)
        .with_context(|| format!("Failed to convert {}", doc_path.display()))?;

    print_diagnostics(&decode_diagnostics);
    print_diagnostics(&settled.diagnostics);
    for change in &settled.changes {
        eprintln!("{}", describe(change));
    }
    if !settled.changed() {
        eprintln!("No block changes");
    }

    // Reloaded by the editor so new nodes keep their ids on the next save
    if let Some(path) = doc_out {
        let tree = settled.doc.unwrap_or(doc);
        write_json(&tree, Some(path))?;
    }

    write_json(session.note(), out)
}

pub(crate) fn describe(change: &BlockChange) -> String {
    match change {
        BlockChange::Inserted { block_id, index } => format!("+ {} at {}", block_id, index),
        BlockChange::Removed { block_id, old_index } => format!("- {} (was {})", block_id, old_index),
        BlockChange::Updated { block_id, index } => format!("~ {} at {}", block_id, index),
        BlockChange::Moved {
            block_id,
            old_index,
            new_index,
        } => format!("> {} {} -> {}", block_id, old_index, new_index),
    }
}
