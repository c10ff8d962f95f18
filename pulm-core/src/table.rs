//! Table structure carried in a table block's `content`.
//!
//! Canonical layout is compact JSON: `{"rows":[["a","b"]],"headerRow":false}`.
//! An empty string stands for the empty 1×1 table. Older notes stored tables
//! as pipe-delimited lines, which are still read when enabled in the config.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{codes, Diagnostic};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub rows: Vec<Vec<String>>,
    /// First row holds column headers
    #[serde(default)]
    pub header_row: bool,
}

impl TableData {
    /// The empty 1×1 table
    pub fn empty() -> Self {
        Self {
            rows: vec![vec![String::new()]],
            header_row: false,
        }
    }

    pub fn is_empty_table(&self) -> bool {
        !self.header_row && self.rows.len() == 1 && self.rows[0].len() == 1 && self.rows[0][0].is_empty()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Serialize into block content
    pub fn to_content(&self) -> String {
        if self.is_empty_table() {
            return String::new();
        }
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Read a table from block content, repairing what can be repaired
    pub fn from_content(content: &str, parse_legacy: bool) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();

        if content.trim().is_empty() {
            return (Self::empty(), diagnostics);
        }

        let mut table = match serde_json::from_str::<TableData>(content) {
            Ok(table) => table,
            Err(err) if parse_legacy => {
                diagnostics.push(
                    Diagnostic::info(codes::LEGACY_TABLE, "read pipe-delimited table layout")
                        .with_context(err.to_string()),
                );
                Self::from_pipe_rows(content)
            }
            Err(err) => {
                diagnostics.push(
                    Diagnostic::warning(
                        codes::INVALID_TABLE,
                        "table content is not a table layout, showing an empty table",
                    )
                    .with_context(err.to_string()),
                );
                return (Self::empty(), diagnostics);
            }
        };

        if table.rows.is_empty() || table.width() == 0 {
            diagnostics.push(Diagnostic::warning(
                codes::INVALID_TABLE,
                "table has no cells, showing an empty table",
            ));
            return (Self::empty(), diagnostics);
        }

        if table.pad_rows() {
            diagnostics.push(Diagnostic::warning(
                codes::RAGGED_TABLE,
                format!("padded rows to {} columns", table.width()),
            ));
        }

        (table, diagnostics)
    }

    /// Parse `| a | b |` style lines; a `|---|` line after the first row marks a header.
    fn from_pipe_rows(content: &str) -> Self {
        let mut rows = Vec::new();
        let mut header_row = false;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if is_separator_line(line) {
                if rows.len() == 1 {
                    header_row = true;
                }
                continue;
            }
            let inner = line.strip_prefix('|').unwrap_or(line);
            let inner = inner.strip_suffix('|').unwrap_or(inner);
            rows.push(inner.split('|').map(|c| c.trim().to_string()).collect());
        }

        Self { rows, header_row }
    }

    /// Pad short rows with empty cells; returns whether anything changed
    fn pad_rows(&mut self) -> bool {
        let width = self.width();
        let mut padded = false;
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
                padded = true;
            }
        }
        padded
    }
}

fn is_separator_line(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]], header_row: bool) -> TableData {
        TableData {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            header_row,
        }
    }

    #[test]
    fn empty_content_is_empty_table() {
        let (t, diagnostics) = TableData::from_content("", true);
        assert!(t.is_empty_table());
        assert!(diagnostics.is_empty());
        assert_eq!(t.to_content(), "");
    }

    #[test]
    fn canonical_layout() {
        let t = table(&[&["Name", "Qty"], &["Tea", "2"]], true);
        let content = t.to_content();
        assert_eq!(content, r#"{"rows":[["Name","Qty"],["Tea","2"]],"headerRow":true}"#);

        let (back, diagnostics) = TableData::from_content(&content, true);
        assert_eq!(back, t);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn reads_markdown_pipe_tables() {
        let content = "| Name | Qty |\n|------|----:|\n| Tea  | 2   |";
        let (t, diagnostics) = TableData::from_content(content, true);

        assert_eq!(t, table(&[&["Name", "Qty"], &["Tea", "2"]], true));
        assert_eq!(diagnostics[0].code, codes::LEGACY_TABLE);
    }

    #[test]
    fn reads_bare_pipe_rows_without_header() {
        let (t, _) = TableData::from_content("a | b\nc | d", true);
        assert_eq!(t, table(&[&["a", "b"], &["c", "d"]], false));
    }

    #[test]
    fn legacy_disabled_falls_back_to_empty() {
        let (t, diagnostics) = TableData::from_content("a | b", false);
        assert!(t.is_empty_table());
        assert_eq!(diagnostics[0].code, codes::INVALID_TABLE);
    }

    #[test]
    fn pads_ragged_rows() {
        let (t, diagnostics) = TableData::from_content(r#"{"rows":[["a","b"],["c"]]}"#, true);
        assert_eq!(t.rows[1], vec!["c".to_string(), String::new()]);
        assert_eq!(diagnostics[0].code, codes::RAGGED_TABLE);
    }

    #[test]
    fn zero_rows_is_invalid() {
        let (t, diagnostics) = TableData::from_content(r#"{"rows":[]}"#, true);
        assert!(t.is_empty_table());
        assert_eq!(diagnostics[0].code, codes::INVALID_TABLE);
    }
}
