//! Source coordinates reported on protocol nodes and errors.
//!
//! The walker operates over text that may itself be embedded in a larger
//! document (a section of a multi-parser file, or an island block inside
//! another grammar). [`ParseTreeWalkerSourceInformation`] carries the
//! coordinate base of the current text so that every [`SourceInformation`]
//! produced refers back to the original document.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::span::Span;

/// Absolute coordinates of a grammar element within its source document.
/// Lines and columns are 1-based, both ends inclusive of the element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInformation {
    pub source_id: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceInformation {
    pub fn new(
        source_id: impl Into<String>,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

impl fmt::Display for SourceInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.source_id, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Coordinate base for a walker over one stretch of text.
///
/// `line_offset` is added to every line. `column_offset` is added only to
/// positions on the first line of the walked text: content on later lines
/// starts at the document's own column 1, so no shift applies there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTreeWalkerSourceInformation {
    source_id: String,
    line_offset: u32,
    column_offset: u32,
    return_source_information: bool,
}

impl ParseTreeWalkerSourceInformation {
    pub fn new(source_id: impl Into<String>, line_offset: u32, column_offset: u32) -> Self {
        Self {
            source_id: source_id.into(),
            line_offset,
            column_offset,
            return_source_information: true,
        }
    }

    /// Suppress source information on produced nodes. Errors still carry
    /// positions.
    pub fn without_source_information(mut self) -> Self {
        self.return_source_information = false;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn line_offset(&self) -> u32 {
        self.line_offset
    }

    pub fn column_offset(&self) -> u32 {
        self.column_offset
    }

    pub fn returns_source_information(&self) -> bool {
        self.return_source_information
    }

    // Column shift applies on the first walked line only.
    fn rebase_column(&self, line: u32, column: u32) -> u32 {
        if line == 1 {
            self.column_offset + column
        } else {
            column
        }
    }

    /// Rebase a span of the walked text into document coordinates.
    pub fn source_information(&self, span: Span) -> SourceInformation {
        // The end position of a span is exclusive; reported end column points
        // at the last character of the element.
        let end_column = span.end.column.saturating_sub(1).max(1);
        SourceInformation {
            source_id: self.source_id.clone(),
            start_line: self.line_offset + span.start.line,
            start_column: self.rebase_column(span.start.line, span.start.column),
            end_line: self.line_offset + span.end.line,
            end_column: self.rebase_column(span.end.line, end_column),
        }
    }

    /// Same as [`source_information`](Self::source_information) but honoring
    /// the suppression flag.
    pub fn node_source_information(&self, span: Span) -> Option<SourceInformation> {
        if self.return_source_information {
            Some(self.source_information(span))
        } else {
            None
        }
    }

    /// Derive the coordinate base for island content that starts right after
    /// an opening delimiter located at `open_span` (with `open_len` characters
    /// of delimiter text). The island's own line 1 is the delimiter's line.
    pub fn for_island(&self, open_span: Span, open_len: usize) -> Self {
        let line_offset = self.line_offset + open_span.start.line - 1;
        let column_offset = if open_span.start.line == 1 {
            self.column_offset
        } else {
            0
        } + (open_span.start.column - 1)
            + open_len as u32;
        Self {
            source_id: self.source_id.clone(),
            line_offset,
            column_offset,
            return_source_information: self.return_source_information,
        }
    }
}
