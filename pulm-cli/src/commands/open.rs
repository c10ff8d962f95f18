//! Show a note as the editor would receive it.

use anyhow::{Context, Result};
use pulm_core::{
    decode_note, ConvertConfig, Diagnostic, DocNode, EditSession, IdAllocator, MentionSource, Note,
};
use serde::Serialize;
use std::path::Path;

use super::{print_diagnostics, read_json, write_json};

#[derive(Serialize)]
struct OpenOutput<'a> {
    doc: &'a DocNode,
    diagnostics: &'a [Diagnostic],
}

pub fn open_note(config: &ConvertConfig, note_path: &Path, notes_path: Option<&Path>, json: bool) -> Result<()> {
    let mut ids = IdAllocator::new(&config.ids);
    let (note, mut diagnostics) = decode_note(&read_json(note_path)?, &mut ids)
        .with_context(|| format!("Failed to read note {}", note_path.display()))?
        .into_parts();

    let all_notes: Option<Vec<Note>> = match notes_path {
        Some(path) => Some(
            serde_json::from_value(read_json(path)?)
                .with_context(|| format!("{} is not a list of notes", path.display()))?,
        ),
        None => None,
    };
    let mentions = all_notes.as_ref().map(|n| n as &dyn MentionSource);

    let (_, doc) = EditSession::open(note, config, mentions, chrono::Utc::now());
    diagnostics.extend(doc.diagnostics);

    if json {
        write_json(
            &OpenOutput {
                doc: &doc.value,
                diagnostics: &diagnostics,
            },
            None,
        )
    } else {
        print_diagnostics(&diagnostics);
        write_json(&doc.value, None)
    }
}
