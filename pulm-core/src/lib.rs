//! # pulm-core
//!
//! Core library for the pulm note model.
//!
//! This crate holds the persisted block model of a note and the conversion
//! layer between that block list and the rich-text document tree the editor
//! works on, in both directions, with diagnostics for everything it repairs.

pub mod config;
pub mod convert;
pub mod decode;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod ids;
pub mod models;
pub mod schema;
pub mod session;
pub mod table;
pub mod text;
pub mod verify;

pub use config::{ConfigError, ConvertConfig};
pub use convert::{blocks_to_doc, doc_to_blocks, ForwardConverter, MentionSource, ReverseConverter};
pub use decode::{decode_blocks, decode_note};
pub use diagnostics::{codes, Converted, Diagnostic, DiagnosticSeverity};
pub use diff::diff_blocks;
pub use error::ConvertError;
pub use ids::{IdAllocator, IdSource};
pub use models::{
    Block, BlockType, ListFamily, MathContent, MathFormat, MediaContent, MediaKind, Note,
    NoteMention,
};
pub use schema::{DocNode, Mark, NodeKind};
pub use session::{EditSession, Settled};
pub use table::TableData;
pub use verify::{blocks_content_eq, check_round_trip, doc_content_eq, RoundTripReport};

pub use pulm_types::{BlockChange, BlockId, CategoryId, NoteId};
