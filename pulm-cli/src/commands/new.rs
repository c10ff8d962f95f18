//! Create a new note.

use anyhow::{bail, Result};
use pulm_core::{CategoryId, Note};

use super::write_json;

/// Print a new note with a single empty text block
pub fn new_note(title: &str, category: &str) -> Result<()> {
    if category.trim().is_empty() {
        bail!("Category id must not be empty");
    }
    let note = Note::new(title, CategoryId::new(category));
    tracing::debug!(note = %note.id, "created note");
    write_json(&note, None)
}
