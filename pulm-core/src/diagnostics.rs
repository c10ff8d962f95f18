//! Non-fatal anomaly reports returned alongside conversion results.

use pulm_types::BlockId;
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Content was dropped or replaced
    Error,
    /// Content was repaired or degraded
    Warning,
    /// Worth knowing, nothing changed
    Info,
}

/// Stable diagnostic codes
pub mod codes {
    pub const UNKNOWN_BLOCK_TYPE: &str = "unknown-block-type";
    pub const MALFORMED_BLOCK: &str = "malformed-block";
    pub const DUPLICATE_BLOCK_ID: &str = "duplicate-block-id";
    pub const STRAY_ATTRIBUTE: &str = "stray-attribute";
    pub const MENTION_OUT_OF_RANGE: &str = "mention-out-of-range";
    pub const MENTION_OVERLAP: &str = "mention-overlap";
    pub const MENTION_SPLITS_CHARACTER: &str = "mention-splits-character";
    pub const MENTION_TEXT_MISMATCH: &str = "mention-text-mismatch";
    pub const MENTION_IGNORED: &str = "mention-ignored";
    pub const MISSING_MENTION: &str = "missing-mention";
    pub const ORPHANED_MENTION: &str = "orphaned-mention";
    pub const STALE_MENTION_TITLE: &str = "stale-mention-title";
    pub const MISSING_MEDIA: &str = "missing-media";
    pub const MISSING_MATH: &str = "missing-math";
    pub const LEGACY_TABLE: &str = "legacy-table";
    pub const INVALID_TABLE: &str = "invalid-table";
    pub const RAGGED_TABLE: &str = "ragged-table";
    pub const UNKNOWN_NODE_TYPE: &str = "unknown-node-type";
    pub const UNKNOWN_INLINE_NODE: &str = "unknown-inline-node";
    pub const NESTED_LIST_FLATTENED: &str = "nested-list-flattened";
    pub const HEADING_LEVEL_CLAMPED: &str = "heading-level-clamped";
    pub const DUPLICATE_NODE_ID: &str = "duplicate-node-id";
    pub const ID_EXHAUSTED: &str = "id-exhausted";
}

/// A single anomaly found while converting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<BlockId>,
    /// Position of the offending block (forward) or top-level node (reverse)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: DiagnosticSeverity, code: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.to_string(),
            block_id: None,
            index: None,
            message: message.into(),
            context: None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, code, message)
    }

    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, code, message)
    }

    pub fn info(code: &str, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Info, code, message)
    }

    pub fn with_block(mut self, block_id: &BlockId) -> Self {
        if !block_id.is_empty() {
            self.block_id = Some(block_id.clone());
        }
        self
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A conversion result together with everything that went wrong producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Converted<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }

    pub fn count(&self, severity: DiagnosticSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(DiagnosticSeverity::Error) > 0
    }

    /// Diagnostics carrying the given code
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }
}

/// Collects diagnostics and mirrors each one to the tracing subscriber.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            code = %diagnostic.code,
            severity = ?diagnostic.severity,
            block = diagnostic.block_id.as_ref().map(|b| b.as_str()).unwrap_or("-"),
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub(crate) fn finish<T>(self, value: T) -> Converted<T> {
        Converted::new(value, self.diagnostics)
    }
}
