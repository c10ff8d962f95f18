//! Lenient decoding of persisted block lists and notes.
//!
//! A note saved by an older or newer app version may hold blocks this version
//! cannot read. Those are salvaged one by one instead of failing the note.

use pulm_types::BlockId;
use serde_json::Value;

use crate::diagnostics::{codes, Converted, Diagnostic, DiagnosticSink};
use crate::error::{json_kind, ConvertError, Result};
use crate::ids::IdAllocator;
use crate::models::{Block, Note};

/// Decode a JSON array of blocks.
///
/// Every id found in the array is observed by `allocator` before any
/// salvaged block is given a fresh one.
pub fn decode_blocks(value: &Value, allocator: &mut IdAllocator) -> Result<Converted<Vec<Block>>> {
    let Value::Array(items) = value else {
        return Err(ConvertError::NotAnArray {
            found: json_kind(value),
        });
    };

    for item in items {
        if let Some(id) = string_field(item, "id") {
            allocator.observe(&BlockId::from(id));
        }
    }

    let mut sink = DiagnosticSink::new();
    let mut blocks = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<Block>(item.clone()) {
            Ok(block) => blocks.push(block),
            Err(err) => {
                let id = match string_field(item, "id") {
                    Some(id) => BlockId::from(id),
                    None => allocator.allocate().id,
                };
                let content = string_field(item, "content")
                    .or_else(|| item.as_str())
                    .unwrap_or_default();
                sink.push(
                    Diagnostic::error(
                        codes::MALFORMED_BLOCK,
                        "block could not be read, kept its text only",
                    )
                    .with_block(&id)
                    .at(index)
                    .with_context(err.to_string()),
                );
                blocks.push(Block::text(id, content));
            }
        }
    }

    tracing::debug!(blocks = blocks.len(), "decoded block list");
    Ok(sink.finish(blocks))
}

/// Decode a note, reading its `blocks` leniently
pub fn decode_note(value: &Value, allocator: &mut IdAllocator) -> Result<Converted<Note>> {
    let mut fields = value.clone();
    let blocks = fields
        .as_object_mut()
        .and_then(|obj| obj.remove("blocks"))
        .unwrap_or_else(|| Value::Array(Vec::new()));

    let mut note: Note = serde_json::from_value(fields)?;
    let (blocks, diagnostics) = decode_blocks(&blocks, allocator)?.into_parts();
    note.blocks = blocks;
    Ok(Converted::new(note, diagnostics))
}

fn string_field<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdConfig;
    use crate::models::BlockType;
    use serde_json::json;

    fn allocator() -> IdAllocator {
        IdAllocator::with_source(&IdConfig::default(), || "fresh".to_string())
    }

    #[test]
    fn non_arrays_are_rejected() {
        let err = decode_blocks(&json!({"id": "x"}), &mut allocator()).unwrap_err();
        assert!(matches!(err, ConvertError::NotAnArray { found: "an object" }));
    }

    #[test]
    fn unknown_tags_decode_without_diagnostics() {
        let out = decode_blocks(
            &json!([{"id": "a", "type": "kanban", "content": "x"}]),
            &mut allocator(),
        )
        .unwrap();
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.value[0].block_type, BlockType::from_tag("kanban"));
    }

    #[test]
    fn malformed_elements_are_salvaged() {
        let out = decode_blocks(
            &json!([
                {"id": "a", "type": "text", "content": "fine"},
                {"id": "b", "type": "todo", "content": "broken", "checked": "yes"},
                42
            ]),
            &mut allocator(),
        )
        .unwrap();

        assert_eq!(out.value.len(), 3);
        assert_eq!(out.value[1].id.as_str(), "b");
        assert_eq!(out.value[1].block_type, BlockType::Text);
        assert_eq!(out.value[1].content, "broken");
        assert_eq!(out.value[2].id.as_str(), "fresh");
        assert_eq!(out.with_code(codes::MALFORMED_BLOCK).count(), 2);
        assert_eq!(out.diagnostics[0].index, Some(1));
    }

    #[test]
    fn salvaged_ids_avoid_existing_ones() {
        let out = decode_blocks(&json!([{"type": 3}, {"id": "fresh", "type": "text"}]), &mut allocator()).unwrap();
        assert_ne!(out.value[0].id.as_str(), "fresh");
    }

    #[test]
    fn notes_decode_with_lenient_blocks() {
        let note = json!({
            "id": "n1",
            "title": "Groceries",
            "blocks": [{"id": "a", "type": "text"}, {"type": null}],
            "categoryId": "c1",
            "createdAt": "2025-03-01T10:00:00Z",
            "updatedAt": "2025-03-01T10:00:00Z"
        });
        let out = decode_note(&note, &mut allocator()).unwrap();
        assert_eq!(out.value.title, "Groceries");
        assert_eq!(out.value.blocks.len(), 2);
        assert!(out.has_errors());
    }
}
