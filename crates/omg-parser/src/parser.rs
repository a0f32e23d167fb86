//! Core parser infrastructure: cursor access, error reporting, shared
//! leaf parsers (identifiers, strings, numbers) and recovery.

use omg_scanner::{is_ident_start, is_word_char, Cursor, Mark};
use omg_types::{AstNode, NodeKind, ParseError, ParseResult, SourceSpan};

/// Maximum group/capture nesting before the parser gives up on a subtree.
pub const MAX_NESTING_DEPTH: u32 = 64;

/// Maximum number of syntax errors recorded for one document.
pub const MAX_ERRORS: usize = 100;

/// The OMG parser.
///
/// Drives a [`Cursor`] directly over the source text (there is no token
/// stream) and builds a positioned [`AstNode`] tree. Errors are collected
/// and parsing resumes where it can.
pub struct Parser {
    cursor: Cursor,
    /// Collected errors.
    errors: Vec<ParseError>,
    /// Current group/capture nesting depth.
    pub(crate) depth: u32,
    /// Set once the nesting limit has been reported.
    pub(crate) depth_reported: bool,
}

impl Parser {
    /// Create a parser over `source`.
    pub fn new(source: &str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
            depth: 0,
            depth_reported: false,
        }
    }

    // ── Cursor Access ─────────────────────────────────────────────────────────

    pub(crate) fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub(crate) fn mark(&self) -> Mark {
        self.cursor.mark()
    }

    pub(crate) fn reset(&mut self, mark: Mark) {
        self.cursor.reset(mark);
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.cursor.peek()
    }

    pub(crate) fn skip_whitespace(&mut self) {
        self.cursor.skip_whitespace();
    }

    /// Span from `start` up to the cursor, clipped to the start line.
    pub(crate) fn span_from(&self, start: Mark) -> SourceSpan {
        let begin = start.position();
        let end = self.cursor.position();
        if end.line == begin.line {
            return SourceSpan::new(begin.line, begin.column, end.column.saturating_sub(begin.column));
        }
        SourceSpan::between(begin, end, self.cursor.line_end_column(start))
    }

    /// Span of the character under the cursor (empty at end of input).
    pub(crate) fn current_span(&self) -> SourceSpan {
        let pos = self.cursor.position();
        let length = match self.peek() {
            Some('\n') | None => 0,
            Some(_) => 1,
        };
        SourceSpan::new(pos.line, pos.column, length)
    }

    /// Skip whitespace, then consume `expected` if present. When it is not
    /// present the cursor is left where it was.
    pub(crate) fn eat_after_whitespace(&mut self, expected: char) -> bool {
        let mark = self.mark();
        self.skip_whitespace();
        if self.cursor.consume(expected) {
            true
        } else {
            self.reset(mark);
            false
        }
    }

    /// Skip whitespace, then consume the word `word` if present.
    pub(crate) fn eat_word_after_whitespace(&mut self, word: &str) -> bool {
        let mark = self.mark();
        self.skip_whitespace();
        if self.cursor.consume_word(word) {
            true
        } else {
            self.reset(mark);
            false
        }
    }

    /// True if the input at the cursor is `IDENT` followed by a single `=`,
    /// i.e. the start of a rule definition.
    pub(crate) fn at_rule_start(&mut self) -> bool {
        if !self.peek().is_some_and(is_ident_start) {
            return false;
        }
        let mark = self.mark();
        self.cursor.take_while(is_word_char);
        self.cursor.skip_inline_whitespace();
        let result = self.cursor.peek() == Some('=') && self.cursor.peek_at(1) != Some('=');
        self.reset(mark);
        result
    }

    /// True if the cursor sits on the keyword `word` used as a keyword, not
    /// as the name of a rule being defined.
    pub(crate) fn at_keyword(&mut self, word: &str) -> bool {
        self.cursor.check_word(word) && !self.at_rule_start()
    }

    /// Skip whitespace up to the next item of a flag list. At the end of
    /// input or the start of the next rule, reports `message` where the list
    /// stopped and consumes nothing.
    pub(crate) fn skip_to_list_item(&mut self, message: &str) -> bool {
        let mark = self.mark();
        self.skip_whitespace();
        if self.cursor.at_end() || self.at_rule_start() {
            self.reset(mark);
            self.error_at_current(message);
            return false;
        }
        true
    }

    // ── Leaf Parsers ──────────────────────────────────────────────────────────

    /// Parse an identifier if one starts at the cursor. Never reports.
    pub(crate) fn parse_identifier(&mut self) -> Option<AstNode> {
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        let start = self.mark();
        let name = self.cursor.take_while(is_word_char);
        Some(AstNode::text(NodeKind::Identifier, name, self.span_from(start)))
    }

    /// Parse an identifier or report `message` at the cursor.
    pub(crate) fn expect_identifier(&mut self, message: &str) -> Option<AstNode> {
        let ident = self.parse_identifier();
        if ident.is_none() {
            self.error_at_current(message);
        }
        ident
    }

    /// Parse a double-quoted string literal if one starts at the cursor.
    ///
    /// The node value keeps the surrounding quotes. An unterminated literal is
    /// reported and returned as written up to the end of its line.
    pub(crate) fn parse_string(&mut self) -> Option<AstNode> {
        if self.peek() != Some('"') {
            return None;
        }
        let start = self.mark();
        self.cursor.advance();
        loop {
            match self.peek() {
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    if !matches!(self.peek(), Some('\n') | None) {
                        self.cursor.advance();
                    }
                }
                Some('\n' | '\r') | None => {
                    let span = self.span_from(start);
                    self.error_at("Unterminated string literal", span);
                    break;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        let raw = self.cursor.slice_from(start);
        Some(AstNode::text(NodeKind::String, raw, self.span_from(start)))
    }

    /// Parse a string literal or report `message` at the cursor.
    pub(crate) fn expect_string(&mut self, message: &str) -> Option<AstNode> {
        let string = self.parse_string();
        if string.is_none() {
            self.error_at_current(message);
        }
        string
    }

    /// Parse an unsigned decimal integer if one starts at the cursor.
    pub(crate) fn parse_number(&mut self) -> Option<AstNode> {
        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        let start = self.mark();
        let digits = self.cursor.take_while(|c| c.is_ascii_digit());
        let span = self.span_from(start);
        match digits.parse::<u64>() {
            Ok(value) => Some(AstNode::number(value, span)),
            Err(_) => {
                self.error_at(format!("Number '{digits}' is too large"), span);
                Some(AstNode::number(u64::MAX, span))
            }
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the cursor.
    pub(crate) fn error_at_current(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, message: impl Into<String>, span: SourceSpan) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(ParseError::new(message, span));
        }
    }

    pub(crate) fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.len() >= MAX_ERRORS
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Consume the rest of the current line.
    pub(crate) fn skip_line(&mut self) {
        while let Some(ch) = self.cursor.advance() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip to the next line that starts a rule definition.
    pub(crate) fn synchronize(&mut self) {
        self.skip_line();
        loop {
            self.skip_whitespace();
            if self.cursor.at_end() || self.at_rule_start() {
                return;
            }
            self.skip_line();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the whole document.
    pub fn parse(mut self) -> ParseResult {
        let ast = self.parse_root();
        ParseResult {
            ast,
            errors: self.errors,
        }
    }
}
