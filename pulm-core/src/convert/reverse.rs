//! Document tree → block list.

use std::collections::HashSet;
use std::slice;

use pulm_types::{BlockId, NoteId};

use crate::diagnostics::{codes, Converted, Diagnostic, DiagnosticSink};
use crate::error::{ConvertError, Result};
use crate::ids::IdAllocator;
use crate::models::{Block, BlockType, ListFamily, MathContent, MathFormat, MediaContent, MediaKind, NoteMention};
use crate::schema::{attr, DocNode, NodeKind};
use crate::table::TableData;
use crate::text::utf16_len;

pub struct ReverseConverter<'a> {
    allocator: &'a mut IdAllocator,
}

impl<'a> ReverseConverter<'a> {
    /// The allocator should live as long as the editing session so ids it
    /// issued are never handed out twice.
    pub fn new(allocator: &'a mut IdAllocator) -> Self {
        Self { allocator }
    }

    /// Flatten `doc` into blocks.
    ///
    /// Fails only when the root is not a document. Unknown nodes degrade to
    /// text blocks and every repair is reported.
    pub fn convert(&mut self, doc: &DocNode) -> Result<Converted<Vec<Block>>> {
        if !doc.is(NodeKind::Doc) {
            return Err(ConvertError::InvalidRoot {
                found: doc.kind.clone(),
            });
        }

        let mut tree_ids = Vec::new();
        collect_ids(doc, &mut tree_ids);
        self.allocator.observe_all(tree_ids.iter());

        let mut pass = Pass {
            allocator: &mut *self.allocator,
            claimed: HashSet::with_capacity(tree_ids.len()),
            sink: DiagnosticSink::new(),
            blocks: Vec::with_capacity(doc.content.len()),
        };

        for (index, node) in doc.content.iter().enumerate() {
            pass.top_level(index, node);
        }

        if pass.blocks.is_empty() {
            let id = pass.fresh_id(0);
            pass.blocks.push(Block::text(id, ""));
        }

        tracing::debug!(
            nodes = doc.content.len(),
            blocks = pass.blocks.len(),
            "converted document to blocks"
        );
        let Pass { sink, blocks, .. } = pass;
        Ok(sink.finish(blocks))
    }
}

/// Block ids carried anywhere in the tree. Mention atoms reuse the `id`
/// attribute for their target note and are skipped.
pub(crate) fn collect_ids(node: &DocNode, out: &mut Vec<BlockId>) {
    if node.is(NodeKind::Mention) {
        return;
    }
    if let Some(id) = node.attr_str(attr::ID).filter(|id| !id.is_empty()) {
        out.push(BlockId::from(id));
    }
    for child in &node.content {
        collect_ids(child, out);
    }
}

/// Text with mention ranges, measured in UTF-16 units as it grows
#[derive(Debug, Default)]
struct InlineText {
    content: String,
    units: usize,
    mentions: Vec<NoteMention>,
}

impl InlineText {
    fn push_str(&mut self, s: &str) {
        self.content.push_str(s);
        self.units += utf16_len(s);
    }

    fn push_mention(&mut self, note_id: &str, label: &str) {
        let start = self.units;
        self.push_str(label);
        self.mentions.push(NoteMention {
            note_id: NoteId::new(note_id),
            title: label.to_string(),
            start,
            end: self.units,
        });
    }

    fn append(&mut self, other: InlineText) {
        let shift = self.units;
        self.mentions.extend(other.mentions.into_iter().map(|mut m| {
            m.start += shift;
            m.end += shift;
            m
        }));
        self.content.push_str(&other.content);
        self.units += other.units;
    }

    fn into_block(self, id: BlockId, block_type: BlockType) -> Block {
        let mut block = Block::new(id, block_type, self.content);
        if !self.mentions.is_empty() {
            block.mentions = Some(self.mentions);
        }
        block
    }
}

struct Pass<'p> {
    allocator: &'p mut IdAllocator,
    /// Ids already given to a block in this pass
    claimed: HashSet<BlockId>,
    sink: DiagnosticSink,
    blocks: Vec<Block>,
}

impl Pass<'_> {
    fn report(&mut self, diagnostic: Diagnostic, index: usize) {
        self.sink.push(diagnostic.at(index));
    }

    /// Id for the block `node` stands for: its own id the first time it is
    /// seen, a fresh one when missing or repeated.
    fn block_id(&mut self, node: &DocNode, index: usize) -> BlockId {
        match node.attr_str(attr::ID).filter(|id| !id.is_empty()) {
            Some(id) if self.claimed.insert(BlockId::from(id)) => BlockId::from(id),
            Some(id) => {
                let fresh = self.fresh_id(index);
                self.report(
                    Diagnostic::info(
                        codes::DUPLICATE_NODE_ID,
                        format!("id {} appears twice, second copy renumbered", id),
                    )
                    .with_block(&fresh)
                    .with_context(id.to_string()),
                    index,
                );
                fresh
            }
            None => self.fresh_id(index),
        }
    }

    fn fresh_id(&mut self, index: usize) -> BlockId {
        let allocation = self.allocator.allocate();
        if allocation.placeholder {
            self.report(
                Diagnostic::error(
                    codes::ID_EXHAUSTED,
                    "could not draw a unique id, using a placeholder",
                )
                .with_block(&allocation.id),
                index,
            );
        }
        self.claimed.insert(allocation.id.clone());
        allocation.id
    }

    fn top_level(&mut self, index: usize, node: &DocNode) {
        let Some(kind) = node.node_kind() else {
            self.unknown(index, node);
            return;
        };

        match kind {
            NodeKind::Paragraph => self.paragraph(index, node),
            NodeKind::Heading => self.heading(index, node),
            NodeKind::Blockquote => {
                let id = self.block_id(node, index);
                let text = self.container_text(&node.content, index);
                self.blocks.push(text.into_block(id, BlockType::Quote));
            }
            NodeKind::CodeBlock => {
                let id = self.block_id(node, index);
                self.blocks.push(Block::new(id, BlockType::Code, node.plain_text()));
            }
            NodeKind::Toggle => {
                let id = self.block_id(node, index);
                let text = self.container_text(&node.content, index);
                let mut block = text.into_block(id, BlockType::Toggle);
                block.is_open = node.attr_bool(attr::OPEN);
                self.blocks.push(block);
            }
            NodeKind::BulletList => self.list(index, node, ListFamily::Bullet),
            NodeKind::OrderedList => self.list(index, node, ListFamily::Numbered),
            NodeKind::TaskList => self.list(index, node, ListFamily::Todo),
            // Items that lost their list wrapper
            NodeKind::ListItem => self.list_item(index, node, ListFamily::Bullet),
            NodeKind::TaskItem => self.list_item(index, node, ListFamily::Todo),
            NodeKind::HorizontalRule => {
                let id = self.block_id(node, index);
                self.blocks.push(Block::new(id, BlockType::Divider, content_attr(node)));
            }
            NodeKind::Table => self.table(index, node),
            NodeKind::Image | NodeKind::Video | NodeKind::Audio | NodeKind::Asset => {
                self.media(index, node, kind)
            }
            NodeKind::Math => self.math(index, node),
            NodeKind::Text | NodeKind::HardBreak | NodeKind::Mention | NodeKind::Emoji => {
                let id = self.fresh_id(index);
                let mut text = InlineText::default();
                self.inline(slice::from_ref(node), &mut text, index);
                self.blocks.push(text.into_block(id, BlockType::Text));
            }
            NodeKind::Doc | NodeKind::TableRow | NodeKind::TableHeader | NodeKind::TableCell => {
                self.unknown(index, node)
            }
        }
    }

    fn paragraph(&mut self, index: usize, node: &DocNode) {
        let id = self.block_id(node, index);
        let marker = node.attr_str(attr::BLOCK_TYPE);

        if let [only] = node.content.as_slice() {
            if marker == Some(BlockType::Emoji.as_str()) && only.is(NodeKind::Emoji) {
                let glyph = only.attr_str(attr::EMOJI).unwrap_or_default();
                self.blocks.push(Block::new(id, BlockType::Emoji, glyph));
                return;
            }
        }

        let mut text = InlineText::default();
        self.inline(&node.content, &mut text, index);

        let mut block_type = BlockType::Text;
        if marker == Some(BlockType::Mention.as_str()) {
            if !text.mentions.is_empty() {
                block_type = BlockType::Mention;
            } else if !node.content.iter().any(|n| n.is(NodeKind::Mention)) {
                self.report(
                    Diagnostic::info(
                        codes::MISSING_MENTION,
                        "mention block no longer holds a mention, stored as text",
                    )
                    .with_block(&id),
                    index,
                );
            }
        }
        self.blocks.push(text.into_block(id, block_type));
    }

    fn heading(&mut self, index: usize, node: &DocNode) {
        let id = self.block_id(node, index);
        let level = node.attr_u64(attr::LEVEL).unwrap_or(1);
        if !(1..=3).contains(&level) {
            self.report(
                Diagnostic::info(
                    codes::HEADING_LEVEL_CLAMPED,
                    format!("heading level {} stored as the nearest supported level", level),
                )
                .with_block(&id),
                index,
            );
        }
        let block_type = BlockType::heading(level.min(3) as u8);

        let mut text = InlineText::default();
        self.inline(&node.content, &mut text, index);
        self.blocks.push(text.into_block(id, block_type));
    }

    fn list(&mut self, index: usize, node: &DocNode, family: ListFamily) {
        for item in &node.content {
            self.list_item(index, item, family);
        }
    }

    /// One block per item; nested lists become the blocks that follow it
    fn list_item(&mut self, index: usize, item: &DocNode, family: ListFamily) {
        let id = self.block_id(item, index);
        let (nested, body): (Vec<&DocNode>, Vec<&DocNode>) =
            item.content.iter().partition(|child| list_family_of(child).is_some());

        let mut text = InlineText::default();
        self.collect_blocks(body.into_iter(), &mut text, index);
        let mut block = text.into_block(id.clone(), family.block_type());
        if family == ListFamily::Todo {
            block.checked = item.attr_bool(attr::CHECKED);
        }
        self.blocks.push(block);

        for list in nested {
            if let Some(inner) = list_family_of(list) {
                self.report(
                    Diagnostic::info(
                        codes::NESTED_LIST_FLATTENED,
                        "nested list items moved to the top level",
                    )
                    .with_block(&id),
                    index,
                );
                self.list(index, list, inner);
            }
        }
    }

    fn table(&mut self, index: usize, node: &DocNode) {
        let id = self.block_id(node, index);
        let mut rows = Vec::new();
        let mut header_row = false;
        let mut dropped_mentions = 0;

        for (r, row) in node.content.iter().filter(|n| n.is(NodeKind::TableRow)).enumerate() {
            if r == 0 {
                header_row = !row.content.is_empty()
                    && row.content.iter().all(|cell| cell.is(NodeKind::TableHeader));
            }
            let cells: Vec<String> = row
                .content
                .iter()
                .map(|cell| {
                    let text = self.container_text(&cell.content, index);
                    dropped_mentions += text.mentions.len();
                    text.content
                })
                .collect();
            rows.push(cells);
        }

        if dropped_mentions > 0 {
            self.report(
                Diagnostic::info(
                    codes::MENTION_IGNORED,
                    format!("{} mention(s) in table cells kept as text", dropped_mentions),
                )
                .with_block(&id),
                index,
            );
        }

        let mut table = TableData { rows, header_row };
        if table.rows.is_empty() || table.width() == 0 {
            table = TableData::empty();
        }
        let (table, diagnostics) = TableData::from_content(&table.to_content(), false);
        self.sink.extend(
            diagnostics
                .into_iter()
                .map(|d| d.with_block(&id).at(index)),
        );
        self.blocks.push(Block::new(id, BlockType::Table, table.to_content()));
    }

    fn media(&mut self, index: usize, node: &DocNode, kind: NodeKind) {
        let id = self.block_id(node, index);
        let (block_type, implied) = match kind {
            NodeKind::Video => (BlockType::Video, Some(MediaKind::Video)),
            NodeKind::Audio => (BlockType::Audio, Some(MediaKind::Audio)),
            NodeKind::Asset => (BlockType::Asset, None),
            _ => (BlockType::Image, Some(MediaKind::Image)),
        };

        let owned = |key: &str| node.attr_str(key).map(str::to_string);
        let src = owned(attr::SRC);
        let alt = owned(attr::ALT);
        // Native image/asset nodes call the caption `title`
        let caption = owned(attr::CAPTION).or_else(|| owned("title"));
        let asset_id = owned(attr::ASSET_ID);
        let declared = node.attr_str(attr::MEDIA_TYPE).and_then(MediaKind::from_str);

        let has_media = src.is_some()
            || alt.is_some()
            || caption.is_some()
            || asset_id.is_some()
            || declared.is_some();

        let mut block = Block::new(id, block_type, content_attr(node));
        if has_media {
            block.media = Some(MediaContent {
                kind: declared.or(implied).unwrap_or(MediaKind::Image),
                src: src.unwrap_or_default(),
                alt,
                caption,
                asset_id,
            });
        }
        self.blocks.push(block);
    }

    fn math(&mut self, index: usize, node: &DocNode) {
        let id = self.block_id(node, index);
        // `latex` is what native math extensions use
        let expression = node
            .attr_str(attr::EXPRESSION)
            .or_else(|| node.attr_str("latex"))
            .map(str::to_string);

        let Some(expression) = expression else {
            self.report(
                Diagnostic::warning(codes::MISSING_MATH, "math node without an expression kept as text")
                    .with_block(&id),
                index,
            );
            self.blocks.push(Block::text(id, node.plain_text()));
            return;
        };

        let format = node
            .attr_str(attr::FORMAT)
            .and_then(MathFormat::from_str)
            .unwrap_or(MathFormat::Latex);
        let mut block = Block::new(id, BlockType::Math, content_attr(node));
        block.math = Some(MathContent { expression, format });
        self.blocks.push(block);
    }

    fn unknown(&mut self, index: usize, node: &DocNode) {
        let id = self.block_id(node, index);
        self.report(
            Diagnostic::warning(
                codes::UNKNOWN_NODE_TYPE,
                format!("unsupported node `{}` kept as plain text", node.kind),
            )
            .with_block(&id)
            .with_context(node.kind.clone()),
            index,
        );
        self.blocks.push(Block::text(id, node.plain_text()));
    }

    /// Text of a container whose children are paragraphs, joined by newlines
    fn container_text(&mut self, children: &[DocNode], index: usize) -> InlineText {
        let mut text = InlineText::default();
        self.collect_blocks(children.iter(), &mut text, index);
        text
    }

    fn collect_blocks<'n>(
        &mut self,
        children: impl Iterator<Item = &'n DocNode>,
        text: &mut InlineText,
        index: usize,
    ) {
        let mut first = true;
        for child in children {
            if child.node_kind().is_some_and(|k| k.is_inline()) {
                self.inline(slice::from_ref(child), text, index);
                first = false;
                continue;
            }
            if !first {
                text.push_str("\n");
            }
            first = false;
            match child.node_kind() {
                Some(NodeKind::Paragraph) | Some(NodeKind::Heading) => {
                    self.inline(&child.content, text, index)
                }
                _ => {
                    let inner = self.container_text(&child.content, index);
                    text.append(inner);
                }
            }
        }
    }

    fn inline(&mut self, nodes: &[DocNode], text: &mut InlineText, index: usize) {
        for node in nodes {
            match node.node_kind() {
                Some(NodeKind::Text) => text.push_str(node.text.as_deref().unwrap_or_default()),
                Some(NodeKind::HardBreak) => text.push_str("\n"),
                Some(NodeKind::Emoji) => text.push_str(node.attr_str(attr::EMOJI).unwrap_or_default()),
                Some(NodeKind::Mention) => {
                    let label = node.attr_str(attr::LABEL).unwrap_or_default();
                    match node.attr_str(attr::MENTION_ID).filter(|id| !id.is_empty()) {
                        Some(note_id) => text.push_mention(note_id, label),
                        None => {
                            self.report(
                                Diagnostic::info(
                                    codes::MISSING_MENTION,
                                    "mention without a target note kept as text",
                                )
                                .with_context(label.to_string()),
                                index,
                            );
                            text.push_str(label);
                        }
                    }
                }
                _ => {
                    self.report(
                        Diagnostic::info(
                            codes::UNKNOWN_INLINE_NODE,
                            format!("inline node `{}` kept as plain text", node.kind),
                        )
                        .with_context(node.kind.clone()),
                        index,
                    );
                    text.push_str(&node.plain_text());
                }
            }
        }
    }
}

fn list_family_of(node: &DocNode) -> Option<ListFamily> {
    match node.node_kind()? {
        NodeKind::BulletList => Some(ListFamily::Bullet),
        NodeKind::OrderedList => Some(ListFamily::Numbered),
        NodeKind::TaskList => Some(ListFamily::Todo),
        _ => None,
    }
}

fn content_attr(node: &DocNode) -> String {
    node.attr_str(attr::CONTENT).unwrap_or_default().to_string()
}
