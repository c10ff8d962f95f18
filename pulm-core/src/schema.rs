//! Document tree vocabulary shared with the editing surface.
//!
//! The tree is the JSON shape the rich-text editor consumes:
//! `{type, attrs?, content?, marks?, text?}`. Only the node types listed in
//! [`NodeKind`] are produced here; anything else coming back from the editor
//! is treated as framework-native and handled leniently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node types produced by the forward converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading,
    Blockquote,
    CodeBlock,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    TaskItem,
    Toggle,
    HorizontalRule,
    Table,
    TableRow,
    TableHeader,
    TableCell,
    Image,
    Video,
    Audio,
    Asset,
    Math,
    Text,
    HardBreak,
    Mention,
    Emoji,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::Blockquote => "blockquote",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::TaskList => "taskList",
            NodeKind::TaskItem => "taskItem",
            NodeKind::Toggle => "toggle",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableHeader => "tableHeader",
            NodeKind::TableCell => "tableCell",
            NodeKind::Image => "image",
            NodeKind::Video => "video",
            NodeKind::Audio => "audio",
            NodeKind::Asset => "asset",
            NodeKind::Math => "math",
            NodeKind::Text => "text",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::Mention => "mention",
            NodeKind::Emoji => "emoji",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "doc" => Some(NodeKind::Doc),
            "paragraph" => Some(NodeKind::Paragraph),
            "heading" => Some(NodeKind::Heading),
            "blockquote" => Some(NodeKind::Blockquote),
            "codeBlock" => Some(NodeKind::CodeBlock),
            "bulletList" => Some(NodeKind::BulletList),
            "orderedList" => Some(NodeKind::OrderedList),
            "listItem" => Some(NodeKind::ListItem),
            "taskList" => Some(NodeKind::TaskList),
            "taskItem" => Some(NodeKind::TaskItem),
            "toggle" => Some(NodeKind::Toggle),
            "horizontalRule" => Some(NodeKind::HorizontalRule),
            "table" => Some(NodeKind::Table),
            "tableRow" => Some(NodeKind::TableRow),
            "tableHeader" => Some(NodeKind::TableHeader),
            "tableCell" => Some(NodeKind::TableCell),
            "image" => Some(NodeKind::Image),
            "video" => Some(NodeKind::Video),
            "audio" => Some(NodeKind::Audio),
            "asset" => Some(NodeKind::Asset),
            "math" => Some(NodeKind::Math),
            "text" => Some(NodeKind::Text),
            "hardBreak" => Some(NodeKind::HardBreak),
            "mention" => Some(NodeKind::Mention),
            "emoji" => Some(NodeKind::Emoji),
            _ => None,
        }
    }

    /// Whether this node holds inline content only
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::HardBreak | NodeKind::Mention | NodeKind::Emoji
        )
    }
}

/// Attribute names
pub mod attr {
    /// Block id on the node that stands for a block
    pub const ID: &str = "id";
    pub const LEVEL: &str = "level";
    pub const CHECKED: &str = "checked";
    pub const OPEN: &str = "open";
    pub const LANGUAGE: &str = "language";
    pub const START: &str = "start";
    pub const SRC: &str = "src";
    pub const ALT: &str = "alt";
    pub const CAPTION: &str = "caption";
    pub const ASSET_ID: &str = "assetId";
    pub const MEDIA_TYPE: &str = "mediaType";
    pub const EXPRESSION: &str = "expression";
    pub const FORMAT: &str = "format";
    /// Block content kept on atomic nodes that have no text children
    pub const CONTENT: &str = "content";
    /// Marks a paragraph wrapping a standalone mention/emoji block
    pub const BLOCK_TYPE: &str = "blockType";
    /// Mention target note id (the editor's mention extension names it `id`)
    pub const MENTION_ID: &str = "id";
    pub const LABEL: &str = "label";
    pub const EMOJI: &str = "emoji";
}

/// Formatting mark on a text node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DocNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DocNode {
    pub fn new(kind: NodeKind) -> Self {
        Self::named(kind.as_str())
    }

    /// Node of an arbitrary (possibly framework-native) type
    pub fn named(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Map::new(),
            content: Vec::new(),
            marks: Vec::new(),
            text: None,
        }
    }

    pub fn doc(content: Vec<DocNode>) -> Self {
        Self::new(NodeKind::Doc).with_content(content)
    }

    pub fn text(text: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Text);
        node.text = Some(text.into());
        node
    }

    pub fn paragraph(content: Vec<DocNode>) -> Self {
        Self::new(NodeKind::Paragraph).with_content(content)
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Set an attribute only when a value is present
    pub fn with_opt_attr<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.attrs.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn with_content(mut self, content: Vec<DocNode>) -> Self {
        self.content = content;
        self
    }

    pub fn node_kind(&self) -> Option<NodeKind> {
        NodeKind::from_str(&self.kind)
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind.as_str()
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attr(key).and_then(Value::as_bool)
    }

    /// Integer attribute, accepting numbers and numeric strings
    pub fn attr_u64(&self, key: &str) -> Option<u64> {
        match self.attr(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Best-effort plain text of this subtree.
    ///
    /// Inline atoms contribute their visible text, block children are
    /// separated by newlines.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_plain_text(self, &mut out);
        out
    }
}

fn collect_plain_text(node: &DocNode, out: &mut String) {
    match node.node_kind() {
        Some(NodeKind::Text) => out.push_str(node.text.as_deref().unwrap_or_default()),
        Some(NodeKind::HardBreak) => out.push('\n'),
        Some(NodeKind::Mention) => out.push_str(node.attr_str(attr::LABEL).unwrap_or_default()),
        Some(NodeKind::Emoji) => out.push_str(node.attr_str(attr::EMOJI).unwrap_or_default()),
        _ => {
            if let Some(text) = &node.text {
                out.push_str(text);
            }
            let mut first = true;
            for child in &node.content {
                let block_child = !child.node_kind().is_some_and(|k| k.is_inline())
                    && child.text.is_none();
                if block_child && !first {
                    out.push('\n');
                }
                collect_plain_text(child, out);
                first = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kinds_round_trip_names() {
        for kind in [NodeKind::TaskItem, NodeKind::HardBreak, NodeKind::HorizontalRule] {
            assert_eq!(NodeKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::from_str("details"), None);
    }

    #[test]
    fn serializes_without_empty_fields() {
        let node = DocNode::paragraph(vec![DocNode::text("hi")]);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"type":"paragraph","content":[{"type":"text","text":"hi"}]}"#);
    }

    #[test]
    fn null_attrs_read_as_absent() {
        let node = DocNode::named("image").with_attr(attr::SRC, Value::Null);
        assert!(node.attr(attr::SRC).is_none());
    }

    #[test]
    fn numeric_attrs_accept_strings() {
        let node = DocNode::new(NodeKind::Heading).with_attr(attr::LEVEL, "2");
        assert_eq!(node.attr_u64(attr::LEVEL), Some(2));
    }

    #[test]
    fn plain_text_joins_blocks_with_newlines() {
        let quote = DocNode::new(NodeKind::Blockquote).with_content(vec![
            DocNode::paragraph(vec![
                DocNode::text("ask "),
                DocNode::new(NodeKind::Mention).with_attr(attr::LABEL, "Ada"),
            ]),
            DocNode::paragraph(vec![DocNode::text("later")]),
        ]);
        assert_eq!(quote.plain_text(), "ask Ada\nlater");
    }
}
