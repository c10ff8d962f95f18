//! Content model structs for notes and their blocks.

use chrono::{DateTime, Utc};
use pulm_types::{BlockId, CategoryId, NoteId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ids;

/// Type tag of a block.
///
/// The set is closed, but tags written by newer front-ends decode to
/// [`BlockType::Unknown`] instead of failing, so a single unfamiliar block
/// never makes a whole note unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockType {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Todo,
    Toggle,
    Quote,
    Code,
    Divider,
    Table,
    Image,
    Video,
    Audio,
    Asset,
    Math,
    Mention,
    Emoji,
    Unknown(String),
}

impl BlockType {
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading1 => "h1",
            BlockType::Heading2 => "h2",
            BlockType::Heading3 => "h3",
            BlockType::BulletList => "bullet-list",
            BlockType::NumberedList => "numbered-list",
            BlockType::Todo => "todo",
            BlockType::Toggle => "toggle",
            BlockType::Quote => "quote",
            BlockType::Code => "code",
            BlockType::Divider => "divider",
            BlockType::Table => "table",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Audio => "audio",
            BlockType::Asset => "asset",
            BlockType::Math => "math",
            BlockType::Mention => "mention",
            BlockType::Emoji => "emoji",
            BlockType::Unknown(tag) => tag,
        }
    }

    pub fn from_tag(s: &str) -> Self {
        match s {
            "text" => BlockType::Text,
            "h1" => BlockType::Heading1,
            "h2" => BlockType::Heading2,
            "h3" => BlockType::Heading3,
            "bullet-list" => BlockType::BulletList,
            "numbered-list" => BlockType::NumberedList,
            "todo" => BlockType::Todo,
            "toggle" => BlockType::Toggle,
            "quote" => BlockType::Quote,
            "code" => BlockType::Code,
            "divider" => BlockType::Divider,
            "table" => BlockType::Table,
            "image" => BlockType::Image,
            "video" => BlockType::Video,
            "audio" => BlockType::Audio,
            "asset" => BlockType::Asset,
            "math" => BlockType::Math,
            "mention" => BlockType::Mention,
            "emoji" => BlockType::Emoji,
            other => BlockType::Unknown(other.to_string()),
        }
    }

    /// Heading level (1-3) for heading blocks
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockType::Heading1 => Some(1),
            BlockType::Heading2 => Some(2),
            BlockType::Heading3 => Some(3),
            _ => None,
        }
    }

    /// Heading block for a level, clamped into 1-3
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => BlockType::Heading1,
            2 => BlockType::Heading2,
            _ => BlockType::Heading3,
        }
    }

    pub fn list_family(&self) -> Option<ListFamily> {
        match self {
            BlockType::BulletList => Some(ListFamily::Bullet),
            BlockType::NumberedList => Some(ListFamily::Numbered),
            BlockType::Todo => Some(ListFamily::Todo),
            _ => None,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(
            self,
            BlockType::Image | BlockType::Video | BlockType::Audio | BlockType::Asset
        )
    }

    /// Whether inline mentions inside `content` are meaningful for this type
    pub fn accepts_mentions(&self) -> bool {
        matches!(
            self,
            BlockType::Text
                | BlockType::Heading1
                | BlockType::Heading2
                | BlockType::Heading3
                | BlockType::BulletList
                | BlockType::NumberedList
                | BlockType::Todo
                | BlockType::Toggle
                | BlockType::Quote
                | BlockType::Mention
        )
    }
}

impl Serialize for BlockType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(BlockType::from_tag(&tag))
    }
}

/// Block types that render as one grouped list when adjacent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListFamily {
    Bullet,
    Numbered,
    Todo,
}

impl ListFamily {
    pub fn block_type(&self) -> BlockType {
        match self {
            ListFamily::Bullet => BlockType::BulletList,
            ListFamily::Numbered => BlockType::NumberedList,
            ListFamily::Todo => BlockType::Todo,
        }
    }
}

/// Inline reference from a block's text to another note.
///
/// `start`/`end` are UTF-16 code unit offsets into the block content, the
/// unit the editor front-end measures strings in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMention {
    pub note_id: NoteId,
    pub title: String,
    pub start: usize,
    pub end: usize,
}

impl NoteMention {
    pub fn new(note_id: impl Into<String>, title: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            note_id: NoteId::new(note_id),
            title: title.into(),
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContent {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

impl MediaContent {
    pub fn new(kind: MediaKind, src: impl Into<String>) -> Self {
        Self {
            kind,
            src: src.into(),
            alt: None,
            caption: None,
            asset_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathFormat {
    /// Display (block-level) LaTeX
    Latex,
    Inline,
}

impl MathFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MathFormat::Latex => "latex",
            MathFormat::Inline => "inline",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "latex" => Some(MathFormat::Latex),
            "inline" => Some(MathFormat::Inline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathContent {
    pub expression: String,
    pub format: MathFormat,
}

/// Persisted unit of note content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,

    #[serde(rename = "type")]
    pub block_type: BlockType,

    #[serde(default)]
    pub content: String,

    /// Todo completion state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    /// Toggle expansion state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<NoteMention>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaContent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math: Option<MathContent>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type,
            content: content.into(),
            checked: None,
            is_open: None,
            mentions: None,
            media: None,
            math: None,
        }
    }

    pub fn text(id: impl Into<BlockId>, content: impl Into<String>) -> Self {
        Self::new(id, BlockType::Text, content)
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    pub fn with_open(mut self, is_open: bool) -> Self {
        self.is_open = Some(is_open);
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<NoteMention>) -> Self {
        self.mentions = Some(mentions);
        self
    }

    pub fn with_media(mut self, media: MediaContent) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_math(mut self, expression: impl Into<String>, format: MathFormat) -> Self {
        self.math = Some(MathContent {
            expression: expression.into(),
            format,
        });
        self
    }

    /// Mentions as a slice, treating an absent list as empty
    pub fn mentions(&self) -> &[NoteMention] {
        self.mentions.as_deref().unwrap_or(&[])
    }
}

/// A note and its content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    pub category_id: CategoryId,

    #[serde(default)]
    pub is_pinned: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_deleted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Create a note with a generated id and a single empty text block
    pub fn new(title: impl Into<String>, category_id: CategoryId) -> Self {
        Self::new_at(title, category_id, Utc::now())
    }

    pub fn new_at(title: impl Into<String>, category_id: CategoryId, now: DateTime<Utc>) -> Self {
        Self {
            id: NoteId::new(ids::generate_id()),
            title: title.into(),
            blocks: vec![Block::text(ids::generate_id(), "")],
            category_id,
            is_pinned: false,
            created_at: now,
            updated_at: now,
            last_opened_at: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Full replace of the block list
    pub fn replace_blocks(&mut self, blocks: Vec<Block>, now: DateTime<Utc>) {
        self.blocks = blocks;
        self.updated_at = now;
    }

    pub fn mark_opened(&mut self, now: DateTime<Utc>) {
        self.last_opened_at = Some(now);
    }

    pub fn set_pinned(&mut self, pinned: bool) {
        self.is_pinned = pinned;
    }

    /// Move the note to the bin; purging is left to the store
    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.is_deleted = true;
        self.deleted_at = Some(now);
    }

    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.deleted_at = None;
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_block_type_tags() {
        assert_eq!(BlockType::from_tag("bullet-list"), BlockType::BulletList);
        assert_eq!(BlockType::from_tag("h2").heading_level(), Some(2));
        assert_eq!(BlockType::Todo.as_str(), "todo");
        assert_eq!(
            BlockType::from_tag("kanban"),
            BlockType::Unknown("kanban".into())
        );
        assert_eq!(BlockType::Unknown("kanban".into()).as_str(), "kanban");
    }

    #[test]
    fn test_heading_clamps() {
        assert_eq!(BlockType::heading(0), BlockType::Heading1);
        assert_eq!(BlockType::heading(2), BlockType::Heading2);
        assert_eq!(BlockType::heading(6), BlockType::Heading3);
    }

    #[test]
    fn test_block_json_shape() {
        let block = Block::new("b1", BlockType::Toggle, "Details").with_open(true);
        let json = serde_json::to_value(&block).unwrap();

        assert_eq!(json["type"], "toggle");
        assert_eq!(json["isOpen"], true);
        assert!(json.get("checked").is_none());
        assert!(json.get("mentions").is_none());
    }

    #[test]
    fn test_block_decodes_front_end_payload() {
        let json = r#"{
            "id": "k2x9",
            "type": "text",
            "content": "See Note X",
            "mentions": [{"noteId": "n1", "title": "X", "start": 8, "end": 9}]
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();

        assert_eq!(block.block_type, BlockType::Text);
        assert_eq!(block.mentions()[0].note_id.as_str(), "n1");
        assert_eq!(block.mentions()[0].end, 9);
    }

    #[test]
    fn test_media_payload() {
        let json = r#"{"id":"m","type":"asset","content":"","media":{"type":"video","src":"asset://1","assetId":"a1"}}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        let media = block.media.unwrap();

        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!(media.asset_id.as_deref(), Some("a1"));
        assert!(media.alt.is_none());
    }

    #[test]
    fn test_new_note_has_single_empty_block() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let note = Note::new_at("Inbox", CategoryId::new("cat-1"), now);

        assert_eq!(note.blocks.len(), 1);
        assert_eq!(note.blocks[0].block_type, BlockType::Text);
        assert!(note.blocks[0].content.is_empty());
        assert_eq!(note.created_at, now);
        assert!(!note.is_deleted);
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        let mut note = Note::new_at("Scratch", CategoryId::new("cat-1"), now);

        note.soft_delete(now);
        assert!(note.is_deleted);
        assert_eq!(note.deleted_at, Some(now));

        note.restore();
        assert!(!note.is_deleted);
        assert!(note.deleted_at.is_none());
    }

    #[test]
    fn test_pin_and_block_lookup() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        let mut note = Note::new_at("Scratch", CategoryId::new("cat-1"), now);
        note.replace_blocks(vec![Block::text("b1", "one"), Block::text("b2", "two")], now);

        note.set_pinned(true);
        assert!(note.is_pinned);
        note.set_pinned(false);
        assert!(!note.is_pinned);

        assert_eq!(note.block(&BlockId::from("b2")).map(|b| b.content.as_str()), Some("two"));
        assert!(note.block(&BlockId::from("b3")).is_none());
    }

    #[test]
    fn test_note_decodes_stored_record() {
        let json = r#"{
            "id": "note-welcome",
            "title": "Welcome to Pulm Notes",
            "blocks": [{"id": "a", "type": "h1", "content": "Welcome to Pulm Notes"}],
            "categoryId": "cat-1",
            "isDefault": true,
            "createdAt": "2025-01-01T00:00:00.000Z",
            "updatedAt": "2025-01-01T00:00:00.000Z"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();

        assert_eq!(note.blocks[0].block_type, BlockType::Heading1);
        assert!(!note.is_pinned);
        assert!(note.last_opened_at.is_none());
    }
}
