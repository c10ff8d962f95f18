//! Round-trip checks used by tests and the `verify` command.

use serde::Serialize;
use serde_json::Value;

use crate::config::ConvertConfig;
use crate::convert::{ForwardConverter, ReverseConverter};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::ids::IdAllocator;
use crate::models::Block;
use crate::schema::{attr, DocNode, NodeKind};

/// Outcome of converting blocks forward and back
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundTripReport {
    /// Same blocks in the same order, ignoring ids
    pub content_equal: bool,
    /// Every block came back with its original id
    pub ids_preserved: bool,
    /// A second forward conversion gives the same tree
    pub idempotent: bool,
    /// Index of the first block that differs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_mismatch: Option<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RoundTripReport {
    pub fn is_lossless(&self) -> bool {
        self.content_equal && self.ids_preserved && self.idempotent
    }
}

/// Block lists with the same types, content and attributes, ids aside
pub fn blocks_content_eq(a: &[Block], b: &[Block]) -> bool {
    first_difference(a, b).is_none()
}

/// Trees with the same shape and attributes, block ids aside
pub fn doc_content_eq(a: &DocNode, b: &DocNode) -> bool {
    if a.kind != b.kind || a.text != b.text || a.marks != b.marks || a.content.len() != b.content.len() {
        return false;
    }

    content_attrs(a) == content_attrs(b)
        && a
            .content
            .iter()
            .zip(&b.content)
            .all(|(x, y)| doc_content_eq(x, y))
}

/// Convert `blocks` forward, back, and forward again
pub fn check_round_trip(blocks: &[Block], config: &ConvertConfig) -> Result<RoundTripReport> {
    let mut allocator = IdAllocator::new(&config.ids);
    allocator.observe_all(blocks.iter().map(|b| &b.id));

    let forward = ForwardConverter::new(config).convert(blocks);
    let back = ReverseConverter::new(&mut allocator).convert(&forward.value)?;
    let again = ForwardConverter::new(config).convert(&back.value);

    let first_mismatch = first_difference(blocks, &back.value);
    let ids_preserved = blocks.len() == back.value.len()
        && blocks.iter().zip(&back.value).all(|(x, y)| x.id == y.id);
    let idempotent = doc_content_eq(&forward.value, &again.value);

    let mut diagnostics = forward.diagnostics;
    diagnostics.extend(back.diagnostics);

    Ok(RoundTripReport {
        content_equal: first_mismatch.is_none(),
        ids_preserved,
        idempotent,
        first_mismatch,
        diagnostics,
    })
}

/// Attributes other than the block id. A mention's `id` names its target
/// note and does count.
fn content_attrs(node: &DocNode) -> Vec<(&String, &Value)> {
    node.attrs
        .iter()
        .filter(|(key, _)| node.is(NodeKind::Mention) || key.as_str() != attr::ID)
        .collect()
}

fn first_difference(a: &[Block], b: &[Block]) -> Option<usize> {
    let differs = a.iter().zip(b).position(|(x, y)| !same_content(x, y));
    match differs {
        Some(index) => Some(index),
        None if a.len() != b.len() => Some(a.len().min(b.len())),
        None => None,
    }
}

fn same_content(a: &Block, b: &Block) -> bool {
    a.block_type == b.block_type
        && a.content == b.content
        && a.checked == b.checked
        && a.is_open == b.is_open
        && a.mentions() == b.mentions()
        && a.media == b.media
        && a.math == b.math
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockType, MathFormat};

    #[test]
    fn ids_do_not_affect_content_equality() {
        let a = vec![Block::text("1", "x"), Block::new("2", BlockType::Quote, "y")];
        let b = vec![Block::text("9", "x"), Block::new("8", BlockType::Quote, "y")];
        assert!(blocks_content_eq(&a, &b));
        assert!(!blocks_content_eq(&a, &b[..1]));
    }

    #[test]
    fn empty_mention_lists_equal_none() {
        let a = Block::text("1", "x");
        let mut b = a.clone();
        b.mentions = Some(Vec::new());
        assert!(blocks_content_eq(&[a], &[b]));
    }

    #[test]
    fn mention_targets_count_in_tree_equality() {
        let mention = |id: &str| {
            DocNode::doc(vec![DocNode::paragraph(vec![DocNode::new(NodeKind::Mention)
                .with_attr(attr::MENTION_ID, id)
                .with_attr(attr::LABEL, "A")])])
        };
        assert!(!doc_content_eq(&mention("n1"), &mention("n2")));

        let para = |id: &str| DocNode::doc(vec![DocNode::paragraph(Vec::new()).with_attr(attr::ID, id)]);
        assert!(doc_content_eq(&para("a"), &para("b")));
    }

    #[test]
    fn well_formed_blocks_round_trip() {
        let blocks = vec![
            Block::new("h", BlockType::Heading2, "Title"),
            Block::new("m", BlockType::Math, "").with_math("e^{i\\pi}", MathFormat::Latex),
            Block::new("g", BlockType::Toggle, "more").with_open(true),
        ];
        let report = check_round_trip(&blocks, &ConvertConfig::default()).unwrap();
        assert!(report.is_lossless(), "{:?}", report);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn reports_first_mismatch_for_repaired_blocks() {
        let blocks = vec![
            Block::text("a", "fine"),
            Block::new("m", BlockType::Math, "x^2"),
        ];
        let report = check_round_trip(&blocks, &ConvertConfig::default()).unwrap();
        assert!(!report.content_equal);
        assert_eq!(report.first_mismatch, Some(1));
        assert!(report.ids_preserved);
    }
}
