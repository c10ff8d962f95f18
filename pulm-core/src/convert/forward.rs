//! Block list → document tree.

use std::collections::HashSet;

use pulm_types::BlockId;
use serde_json::Value;

use super::MentionSource;
use crate::config::ConvertConfig;
use crate::diagnostics::{codes, Converted, Diagnostic, DiagnosticSink};
use crate::models::{Block, BlockType, ListFamily, MathFormat};
use crate::schema::{attr, DocNode, NodeKind};
use crate::table::TableData;
use crate::text::resolve_mentions;

pub struct ForwardConverter<'a> {
    config: &'a ConvertConfig,
    mentions: Option<&'a dyn MentionSource>,
}

impl<'a> ForwardConverter<'a> {
    pub fn new(config: &'a ConvertConfig) -> Self {
        Self {
            config,
            mentions: None,
        }
    }

    /// Check mention targets against a note lookup
    pub fn with_mentions(mut self, source: &'a dyn MentionSource) -> Self {
        self.mentions = Some(source);
        self
    }

    /// Build the document tree for `blocks`.
    ///
    /// Never fails and never returns an empty document: an empty block list
    /// produces a single empty paragraph.
    pub fn convert(&self, blocks: &[Block]) -> Converted<DocNode> {
        let mut sink = DiagnosticSink::new();
        let mut seen: HashSet<&BlockId> = HashSet::with_capacity(blocks.len());
        let mut children = Vec::with_capacity(blocks.len());

        for (index, block) in blocks.iter().enumerate() {
            self.inspect(index, block, &mut seen, &mut sink);
        }

        let mut index = 0;
        while index < blocks.len() {
            let block = &blocks[index];

            // Consecutive blocks of one list family share a single list node
            if let Some(family) = block.block_type.list_family() {
                let run_end = blocks[index..]
                    .iter()
                    .position(|b| b.block_type.list_family() != Some(family))
                    .map_or(blocks.len(), |offset| index + offset);
                let items = (index..run_end)
                    .map(|i| self.list_item(i, &blocks[i], family, &mut sink))
                    .collect();
                children.push(list_node(family, items));
                index = run_end;
                continue;
            }

            children.push(self.block_node(index, block, &mut sink));
            index += 1;
        }

        if children.is_empty() {
            children.push(DocNode::paragraph(Vec::new()));
        }

        tracing::debug!(
            blocks = blocks.len(),
            nodes = children.len(),
            "converted blocks to document"
        );
        sink.finish(DocNode::doc(children))
    }

    /// Report duplicate ids and fields that mean nothing for the block type
    fn inspect<'b>(
        &self,
        index: usize,
        block: &'b Block,
        seen: &mut HashSet<&'b BlockId>,
        sink: &mut DiagnosticSink,
    ) {
        let report = |sink: &mut DiagnosticSink, d: Diagnostic| sink.push(d.with_block(&block.id).at(index));

        if !block.id.is_empty() && !seen.insert(&block.id) {
            report(
                sink,
                Diagnostic::warning(
                    codes::DUPLICATE_BLOCK_ID,
                    format!("block id {} is used more than once", block.id),
                ),
            );
        }

        let ty = &block.block_type;
        let stray = [
            ("checked", block.checked.is_some() && *ty != BlockType::Todo),
            ("isOpen", block.is_open.is_some() && *ty != BlockType::Toggle),
            ("media", block.media.is_some() && !ty.is_media()),
            ("math", block.math.is_some() && *ty != BlockType::Math),
        ];
        for (field, present) in stray {
            if present {
                report(
                    sink,
                    Diagnostic::info(
                        codes::STRAY_ATTRIBUTE,
                        format!("ignoring `{}` on a {} block", field, ty.as_str()),
                    ),
                );
            }
        }

        if !block.mentions().is_empty() && !ty.accepts_mentions() {
            report(
                sink,
                Diagnostic::info(
                    codes::MENTION_IGNORED,
                    format!(
                        "ignoring {} mention(s) on a {} block",
                        block.mentions().len(),
                        ty.as_str()
                    ),
                ),
            );
        }
    }

    fn block_node(&self, index: usize, block: &Block, sink: &mut DiagnosticSink) -> DocNode {
        match &block.block_type {
            BlockType::Text => {
                with_id(DocNode::new(NodeKind::Paragraph), block)
                    .with_content(self.inline_content(index, block, sink))
            }
            BlockType::Heading1 | BlockType::Heading2 | BlockType::Heading3 => {
                let level = block.block_type.heading_level().unwrap_or(1);
                with_id(DocNode::new(NodeKind::Heading), block)
                    .with_attr(attr::LEVEL, level)
                    .with_content(self.inline_content(index, block, sink))
            }
            BlockType::Quote => with_id(DocNode::new(NodeKind::Blockquote), block).with_content(vec![
                DocNode::paragraph(self.inline_content(index, block, sink)),
            ]),
            BlockType::Code => {
                // Code keeps its newlines as raw text
                let code = if block.content.is_empty() {
                    Vec::new()
                } else {
                    vec![DocNode::text(block.content.clone())]
                };
                with_id(DocNode::new(NodeKind::CodeBlock), block)
                    .with_attr(attr::LANGUAGE, Value::Null)
                    .with_content(code)
            }
            BlockType::Toggle => with_id(DocNode::new(NodeKind::Toggle), block)
                .with_opt_attr(attr::OPEN, block.is_open)
                .with_content(vec![DocNode::paragraph(
                    self.inline_content(index, block, sink),
                )]),
            BlockType::BulletList | BlockType::NumberedList | BlockType::Todo => {
                let family = block.block_type.list_family().unwrap_or(ListFamily::Bullet);
                list_node(family, vec![self.list_item(index, block, family, sink)])
            }
            BlockType::Divider => {
                with_content_attr(with_id(DocNode::new(NodeKind::HorizontalRule), block), block)
            }
            BlockType::Table => self.table_node(index, block, sink),
            BlockType::Image | BlockType::Video | BlockType::Audio | BlockType::Asset => {
                self.media_node(index, block, sink)
            }
            BlockType::Math => self.math_node(index, block, sink),
            BlockType::Mention => self.mention_block(index, block, sink),
            BlockType::Emoji => with_id(DocNode::new(NodeKind::Paragraph), block)
                .with_attr(attr::BLOCK_TYPE, BlockType::Emoji.as_str())
                .with_content(vec![
                    DocNode::new(NodeKind::Emoji).with_attr(attr::EMOJI, block.content.clone())
                ]),
            BlockType::Unknown(tag) => {
                sink.push(
                    Diagnostic::warning(
                        codes::UNKNOWN_BLOCK_TYPE,
                        format!("unknown block type `{}` shown as plain text", tag),
                    )
                    .with_block(&block.id)
                    .at(index),
                );
                let mut runs = Vec::new();
                push_text_runs(&block.content, &mut runs);
                with_id(DocNode::new(NodeKind::Paragraph), block).with_content(runs)
            }
        }
    }

    fn list_item(
        &self,
        index: usize,
        block: &Block,
        family: ListFamily,
        sink: &mut DiagnosticSink,
    ) -> DocNode {
        let item = match family {
            ListFamily::Todo => {
                DocNode::new(NodeKind::TaskItem).with_opt_attr(attr::CHECKED, block.checked)
            }
            ListFamily::Bullet | ListFamily::Numbered => DocNode::new(NodeKind::ListItem),
        };
        with_id(item, block).with_content(vec![DocNode::paragraph(
            self.inline_content(index, block, sink),
        )])
    }

    /// Text runs, hard breaks and mention atoms for a text-bearing block
    fn inline_content(&self, index: usize, block: &Block, sink: &mut DiagnosticSink) -> Vec<DocNode> {
        let mut out = Vec::new();
        if block.mentions().is_empty() || !block.block_type.accepts_mentions() {
            push_text_runs(&block.content, &mut out);
            return out;
        }

        let (resolved, diagnostics) = resolve_mentions(&block.content, block.mentions());
        sink.extend(
            diagnostics
                .into_iter()
                .map(|d| d.with_block(&block.id).at(index)),
        );

        let mut cursor = 0;
        for hit in resolved {
            push_text_runs(&block.content[cursor..hit.byte_start], &mut out);
            self.check_target(index, block, &hit.mention.note_id, &hit.mention.title, sink);
            out.push(
                DocNode::new(NodeKind::Mention)
                    .with_attr(attr::MENTION_ID, hit.mention.note_id.as_str())
                    .with_attr(attr::LABEL, hit.mention.title.clone()),
            );
            cursor = hit.byte_end;
        }
        push_text_runs(&block.content[cursor..], &mut out);
        out
    }

    fn check_target(
        &self,
        index: usize,
        block: &Block,
        note_id: &pulm_types::NoteId,
        title: &str,
        sink: &mut DiagnosticSink,
    ) {
        let Some(source) = self.mentions else {
            return;
        };
        match source.note_title(note_id) {
            None => sink.push(
                Diagnostic::warning(
                    codes::ORPHANED_MENTION,
                    format!("mention points at missing note {}", note_id),
                )
                .with_block(&block.id)
                .at(index)
                .with_context(title.to_string()),
            ),
            Some(current) if current != title => sink.push(
                Diagnostic::info(
                    codes::STALE_MENTION_TITLE,
                    format!("note {} is now titled {:?}", note_id, current),
                )
                .with_block(&block.id)
                .at(index)
                .with_context(title.to_string()),
            ),
            Some(_) => {}
        }
    }

    fn mention_block(&self, index: usize, block: &Block, sink: &mut DiagnosticSink) -> DocNode {
        let content = self.inline_content(index, block, sink);
        let has_mention = content.iter().any(|n| n.is(NodeKind::Mention));
        if !has_mention {
            sink.push(
                Diagnostic::warning(
                    codes::MISSING_MENTION,
                    "mention block has no usable mention, shown as plain text",
                )
                .with_block(&block.id)
                .at(index),
            );
            return with_id(DocNode::new(NodeKind::Paragraph), block).with_content(content);
        }
        with_id(DocNode::new(NodeKind::Paragraph), block)
            .with_attr(attr::BLOCK_TYPE, BlockType::Mention.as_str())
            .with_content(content)
    }

    fn table_node(&self, index: usize, block: &Block, sink: &mut DiagnosticSink) -> DocNode {
        let (table, diagnostics) =
            TableData::from_content(&block.content, self.config.tables.parse_legacy);
        sink.extend(
            diagnostics
                .into_iter()
                .map(|d| d.with_block(&block.id).at(index)),
        );

        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                let cell_kind = if table.header_row && r == 0 {
                    NodeKind::TableHeader
                } else {
                    NodeKind::TableCell
                };
                let cells = row
                    .iter()
                    .map(|cell| {
                        let mut runs = Vec::new();
                        push_text_runs(cell, &mut runs);
                        DocNode::new(cell_kind).with_content(vec![DocNode::paragraph(runs)])
                    })
                    .collect();
                DocNode::new(NodeKind::TableRow).with_content(cells)
            })
            .collect();

        with_id(DocNode::new(NodeKind::Table), block).with_content(rows)
    }

    fn media_node(&self, index: usize, block: &Block, sink: &mut DiagnosticSink) -> DocNode {
        let kind = match block.block_type {
            BlockType::Video => NodeKind::Video,
            BlockType::Audio => NodeKind::Audio,
            BlockType::Asset => NodeKind::Asset,
            _ => NodeKind::Image,
        };
        let node = with_content_attr(with_id(DocNode::new(kind), block), block);

        let Some(media) = &block.media else {
            sink.push(
                Diagnostic::info(
                    codes::MISSING_MEDIA,
                    format!("{} block has no media reference", block.block_type.as_str()),
                )
                .with_block(&block.id)
                .at(index),
            );
            return node
                .with_attr(attr::SRC, Value::Null)
                .with_attr(attr::ALT, Value::Null)
                .with_attr(attr::CAPTION, Value::Null)
                .with_attr(attr::ASSET_ID, Value::Null);
        };

        node.with_attr(attr::SRC, media.src.clone())
            .with_attr(attr::ALT, optional(&media.alt))
            .with_attr(attr::CAPTION, optional(&media.caption))
            .with_attr(attr::ASSET_ID, optional(&media.asset_id))
            .with_attr(attr::MEDIA_TYPE, media.kind.as_str())
    }

    fn math_node(&self, index: usize, block: &Block, sink: &mut DiagnosticSink) -> DocNode {
        let node = with_id(DocNode::new(NodeKind::Math), block);
        match &block.math {
            Some(math) => with_content_attr(node, block)
                .with_attr(attr::EXPRESSION, math.expression.clone())
                .with_attr(attr::FORMAT, math.format.as_str()),
            None => {
                sink.push(
                    Diagnostic::warning(
                        codes::MISSING_MATH,
                        "math block has no expression, using its content",
                    )
                    .with_block(&block.id)
                    .at(index),
                );
                node.with_attr(attr::EXPRESSION, block.content.clone())
                    .with_attr(attr::FORMAT, MathFormat::Latex.as_str())
            }
        }
    }
}

fn list_node(family: ListFamily, items: Vec<DocNode>) -> DocNode {
    match family {
        ListFamily::Bullet => DocNode::new(NodeKind::BulletList),
        ListFamily::Numbered => DocNode::new(NodeKind::OrderedList).with_attr(attr::START, 1),
        ListFamily::Todo => DocNode::new(NodeKind::TaskList),
    }
    .with_content(items)
}

fn with_id(node: DocNode, block: &Block) -> DocNode {
    if block.id.is_empty() {
        node
    } else {
        node.with_attr(attr::ID, block.id.as_str())
    }
}

/// Atomic nodes have no text children, so content rides along as an attribute
fn with_content_attr(node: DocNode, block: &Block) -> DocNode {
    if block.content.is_empty() {
        node
    } else {
        node.with_attr(attr::CONTENT, block.content.clone())
    }
}

fn optional(value: &Option<String>) -> Value {
    value.clone().map_or(Value::Null, Value::String)
}

/// Split text on newlines into text nodes and hard breaks, skipping empty runs
fn push_text_runs(text: &str, out: &mut Vec<DocNode>) {
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            out.push(DocNode::new(NodeKind::HardBreak));
        }
        if !part.is_empty() {
            out.push(DocNode::text(part));
        }
    }
}
