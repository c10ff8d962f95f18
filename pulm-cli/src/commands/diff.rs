//! Block-level diff between two note versions.

use anyhow::{Context, Result};
use pulm_core::{
    decode_blocks, decode_note, diff_blocks, Block, ConvertConfig, Converted, IdAllocator,
};
use serde_json::Value;
use std::path::Path;

use super::save::describe;
use super::{print_diagnostics, read_json, write_json};

pub fn diff_notes(config: &ConvertConfig, before: &Path, after: &Path, json: bool) -> Result<()> {
    let mut ids = IdAllocator::new(&config.ids);
    let old = read_blocks(before, &mut ids)?;
    let new = read_blocks(after, &mut ids)?;

    let changes = diff_blocks(&old, &new);
    if json {
        return write_json(&changes, None);
    }

    if changes.is_empty() {
        println!("No block changes");
    }
    for change in &changes {
        println!("{}", describe(change));
    }
    Ok(())
}

/// Blocks from either a note object or a bare block array
fn read_blocks(path: &Path, ids: &mut IdAllocator) -> Result<Vec<Block>> {
    let value = read_json(path)?;
    let converted = match &value {
        Value::Array(_) => decode_blocks(&value, ids),
        _ => decode_note(&value, ids).map(|note| {
            let (note, diagnostics) = note.into_parts();
            Converted::new(note.blocks, diagnostics)
        }),
    }
    .with_context(|| format!("Failed to read blocks from {}", path.display()))?;

    print_diagnostics(&converted.diagnostics);
    Ok(converted.value)
}
