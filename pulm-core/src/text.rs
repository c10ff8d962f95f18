//! UTF-16 offset handling for mention ranges.
//!
//! Mention offsets are stored in UTF-16 code units; Rust strings index by
//! byte. Everything that crosses between the two goes through here.

use crate::diagnostics::{codes, Diagnostic};
use crate::models::NoteMention;

/// Length of `s` in UTF-16 code units
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Byte index of a UTF-16 offset.
///
/// `None` when the offset is past the end or falls between the two halves of
/// a surrogate pair.
pub fn utf16_to_byte(s: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (byte, ch) in s.char_indices() {
        if units == offset {
            return Some(byte);
        }
        if units > offset {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == offset).then_some(s.len())
}

/// A mention whose range has been checked against its block content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMention<'a> {
    pub mention: &'a NoteMention,
    pub byte_start: usize,
    pub byte_end: usize,
}

/// Validate mention ranges against `content`.
///
/// Returns the usable mentions in text order. Out-of-range, overlapping and
/// surrogate-splitting ranges are dropped with a warning. A range that missed
/// its title by one unit is shifted onto it; any other covered text that
/// differs from the title is kept. Both are reported.
pub fn resolve_mentions<'a>(
    content: &str,
    mentions: &'a [NoteMention],
) -> (Vec<ResolvedMention<'a>>, Vec<Diagnostic>) {
    let mut ordered: Vec<&NoteMention> = mentions.iter().collect();
    ordered.sort_by_key(|m| (m.start, m.end));

    let len = utf16_len(content);
    let mut resolved: Vec<ResolvedMention<'a>> = Vec::with_capacity(ordered.len());
    let mut diagnostics = Vec::new();
    let mut covered_until = 0usize;

    for mention in ordered {
        if mention.start > mention.end || mention.end > len {
            diagnostics.push(
                Diagnostic::warning(
                    codes::MENTION_OUT_OF_RANGE,
                    format!(
                        "mention of {} at [{}, {}) is outside content of length {}",
                        mention.note_id, mention.start, mention.end, len
                    ),
                )
                .with_context(mention.title.clone()),
            );
            continue;
        }

        if !resolved.is_empty() && mention.start < covered_until {
            diagnostics.push(
                Diagnostic::warning(
                    codes::MENTION_OVERLAP,
                    format!(
                        "mention of {} at [{}, {}) overlaps the previous mention",
                        mention.note_id, mention.start, mention.end
                    ),
                )
                .with_context(mention.title.clone()),
            );
            continue;
        }

        let (Some(byte_start), Some(byte_end)) = (
            utf16_to_byte(content, mention.start),
            utf16_to_byte(content, mention.end),
        ) else {
            diagnostics.push(
                Diagnostic::warning(
                    codes::MENTION_SPLITS_CHARACTER,
                    format!(
                        "mention of {} at [{}, {}) splits a character",
                        mention.note_id, mention.start, mention.end
                    ),
                )
                .with_context(mention.title.clone()),
            );
            continue;
        };

        let covered = &content[byte_start..byte_end];
        if covered == mention.title {
            covered_until = mention.end;
            resolved.push(ResolvedMention {
                mention,
                byte_start,
                byte_end,
            });
            continue;
        }

        if let Some((start, end, bytes)) = adjacent_title(content, mention, covered_until) {
            diagnostics.push(
                Diagnostic::info(
                    codes::MENTION_TEXT_MISMATCH,
                    format!(
                        "mention of {} moved from [{}, {}) to [{}, {}) where its title {:?} is",
                        mention.note_id, mention.start, mention.end, start, end, mention.title
                    ),
                )
                .with_context(mention.note_id.to_string()),
            );
            covered_until = end;
            resolved.push(ResolvedMention {
                mention,
                byte_start: bytes.0,
                byte_end: bytes.1,
            });
            continue;
        }

        diagnostics.push(
            Diagnostic::info(
                codes::MENTION_TEXT_MISMATCH,
                format!(
                    "mention text {:?} will be shown as its title {:?}",
                    covered, mention.title
                ),
            )
            .with_context(mention.note_id.to_string()),
        );
        covered_until = mention.end;
        resolved.push(ResolvedMention {
            mention,
            byte_start,
            byte_end,
        });
    }

    (resolved, diagnostics)
}

/// The title one unit to either side of a range that missed it.
///
/// Returns the UTF-16 range and its byte bounds. Only windows that start at
/// or after `floor` are considered so the shifted range never overlaps an
/// earlier mention.
fn adjacent_title(
    content: &str,
    mention: &NoteMention,
    floor: usize,
) -> Option<(usize, usize, (usize, usize))> {
    if mention.title.is_empty() {
        return None;
    }
    let width = utf16_len(&mention.title);
    let candidates = [mention.start.checked_add(1), mention.start.checked_sub(1)];
    candidates
        .into_iter()
        .flatten()
        .filter(|start| *start >= floor)
        .find_map(|start| {
            let end = start + width;
            let byte_start = utf16_to_byte(content, start)?;
            let byte_end = utf16_to_byte(content, end)?;
            (content[byte_start..byte_end] == mention.title).then_some((start, end, (byte_start, byte_end)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_offsets_map_to_bytes() {
        let s = "a😀b";
        assert_eq!(utf16_len(s), 4);
        assert_eq!(utf16_to_byte(s, 0), Some(0));
        assert_eq!(utf16_to_byte(s, 1), Some(1));
        assert_eq!(utf16_to_byte(s, 2), None);
        assert_eq!(utf16_to_byte(s, 3), Some(5));
        assert_eq!(utf16_to_byte(s, 4), Some(6));
        assert_eq!(utf16_to_byte(s, 5), None);
    }

    #[test]
    fn keeps_valid_mentions_in_text_order() {
        let mentions = vec![
            NoteMention::new("n2", "B", 6, 7),
            NoteMention::new("n1", "A", 0, 1),
        ];
        let (resolved, diagnostics) = resolve_mentions("A and B", &mentions);

        assert!(diagnostics.is_empty());
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].mention.note_id.as_str(), "n1");
        assert_eq!((resolved[1].byte_start, resolved[1].byte_end), (6, 7));
    }

    #[test]
    fn drops_out_of_range_and_overlapping() {
        let mentions = vec![
            NoteMention::new("n1", "Note", 0, 4),
            NoteMention::new("n2", "ote", 1, 4),
            NoteMention::new("n3", "far", 10, 20),
            NoteMention::new("n4", "bad", 3, 2),
        ];
        let (resolved, diagnostics) = resolve_mentions("Note", &mentions);

        assert_eq!(resolved.len(), 1);
        let found: Vec<&str> = diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(found.iter().filter(|c| **c == codes::MENTION_OUT_OF_RANGE).count(), 2);
        assert!(found.contains(&codes::MENTION_OVERLAP));
    }

    #[test]
    fn drops_mentions_splitting_surrogates() {
        let mentions = vec![NoteMention::new("n1", "x", 1, 2)];
        let (resolved, diagnostics) = resolve_mentions("😀", &mentions);

        assert!(resolved.is_empty());
        assert_eq!(diagnostics[0].code, codes::MENTION_SPLITS_CHARACTER);
    }

    #[test]
    fn shifts_a_range_that_sits_next_to_its_title() {
        let mentions = vec![NoteMention::new("n1", "X", 8, 9)];
        let (resolved, diagnostics) = resolve_mentions("See Note X", &mentions);

        assert_eq!(resolved.len(), 1);
        assert_eq!((resolved[0].byte_start, resolved[0].byte_end), (9, 10));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, codes::MENTION_TEXT_MISMATCH);
    }

    #[test]
    fn shift_never_lands_on_an_earlier_mention() {
        let mentions = vec![
            NoteMention::new("n1", "A", 0, 1),
            NoteMention::new("n2", "A", 1, 2),
        ];
        let (resolved, _) = resolve_mentions("AB", &mentions);

        assert_eq!(resolved.len(), 2);
        assert_eq!((resolved[1].byte_start, resolved[1].byte_end), (1, 2));
    }

    #[test]
    fn reports_title_mismatch_but_keeps_mention() {
        let mentions = vec![NoteMention::new("n1", "Xavier", 4, 6)];
        let (resolved, diagnostics) = resolve_mentions("See @X", &mentions);

        assert_eq!(resolved.len(), 1);
        assert_eq!(diagnostics[0].code, codes::MENTION_TEXT_MISMATCH);
    }
}
