use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based source position. `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source location span: a start position plus a character count.
///
/// Spans never cross lines. A construct that continues past its first line
/// is spanned from its first character to the end of that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub line: u32,
    pub column: u32,
    pub length: u32,
}

impl SourceSpan {
    /// Create a new span.
    pub fn new(line: u32, column: u32, length: u32) -> Self {
        Self {
            line,
            column,
            length,
        }
    }

    /// Create a zero-width span at a single position.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, 0)
    }

    /// Span running from `start` up to (not including) `end`.
    ///
    /// When `end` lies on a later line the span is clipped at
    /// `first_line_end`, the column just past the last character of the
    /// start line.
    pub fn between(start: Position, end: Position, first_line_end: u32) -> Self {
        let stop = if end.line == start.line {
            end.column
        } else {
            first_line_end
        };
        Self::new(start.line, start.column, stop.saturating_sub(start.column))
    }

    /// Column just past the last covered character.
    pub fn end_column(&self) -> u32 {
        self.column + self.length
    }

    /// True if the position falls inside `[column, column + length)` on `line`.
    pub fn contains(&self, line: u32, column: u32) -> bool {
        self.line == line && column >= self.column && column < self.end_column()
    }

    /// True if `other` lies entirely within this span.
    pub fn encloses(&self, other: &SourceSpan) -> bool {
        self.line == other.line
            && other.column >= self.column
            && other.end_column() <= self.end_column()
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Holds the source text of one document for line-oriented lookups.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number, without its terminator.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        if idx >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1)) // strip the \n
            .unwrap_or(self.source.len());
        let line = &self.source[start..end];
        // Also strip trailing \r for CRLF
        Some(line.trim_end_matches('\r'))
    }

    /// Iterate over `(line_number, text)` pairs.
    pub fn lines(&self) -> impl Iterator<Item = (u32, &str)> {
        (1..=self.line_starts.len() as u32).filter_map(|n| self.line(n).map(|text| (n, text)))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Build a span for a byte range inside line `line_number`.
    ///
    /// Byte offsets (as produced by `regex`) are converted to character
    /// columns. Offsets that do not fall on a char boundary are clamped.
    pub fn span_for_bytes(&self, line_number: u32, start: usize, end: usize) -> Option<SourceSpan> {
        let text = self.line(line_number)?;
        let start = start.min(text.len());
        let end = end.clamp(start, text.len());
        let column = text.get(..start)?.chars().count() as u32 + 1;
        let length = text.get(start..end)?.chars().count() as u32;
        Some(SourceSpan::new(line_number, column, length))
    }
}
