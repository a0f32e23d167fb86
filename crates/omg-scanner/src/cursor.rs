//! Character cursor over OMG source text.
//!
//! The parser is tokenless: it drives this cursor directly. Every operation
//! reports success through a `bool` or an `Option`, none of them panic.
//!
//! Features:
//! - Character-based columns (a multi-byte character advances the column by one)
//! - `\n` ends a line and resets the column to 1
//! - Word matching delimited by `[A-Za-z0-9_-]` boundaries
//! - `#` line comments treated as whitespace
//! - Cheap [`Mark`] checkpoints for bounded lookahead

use omg_types::Position;

/// Saved cursor state, restored with [`Cursor::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

impl Mark {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// True for characters that may appear inside an OMG word.
pub fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

/// True for characters that may start an identifier.
pub fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// End column of every line; a line's content stops at `\r` or `\n`.
fn line_end_columns(chars: &[char]) -> Vec<u32> {
    let mut ends = Vec::new();
    let mut width = 0u32;
    let mut stopped = false;
    for &ch in chars {
        match ch {
            '\n' => {
                ends.push(width + 1);
                width = 0;
                stopped = false;
            }
            '\r' => stopped = true,
            _ if !stopped => width += 1,
            _ => {}
        }
    }
    ends.push(width + 1);
    ends
}

/// The OMG character cursor.
#[derive(Debug, Clone)]
pub struct Cursor {
    /// The full source text, one entry per character.
    chars: Vec<char>,
    /// Current index into `chars`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Column just past the last character of each line, indexed by line - 1.
    line_ends: Vec<u32>,
}

impl Cursor {
    /// Create a cursor at the start of `source`.
    pub fn new(source: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let line_ends = line_end_columns(&chars);
        Self {
            chars,
            pos: 0,
            line: 1,
            column: 1,
            line_ends,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Character `offset` places ahead of the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    // ─────────────────────────────────────────────────────────────
    // Checkpoints
    // ─────────────────────────────────────────────────────────────

    pub fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos.min(self.chars.len());
        self.line = mark.line;
        self.column = mark.column;
    }

    /// Source text between `mark` and the cursor.
    pub fn slice_from(&self, mark: Mark) -> String {
        let start = mark.pos.min(self.pos);
        self.chars[start..self.pos].iter().collect()
    }

    /// Column just past the last character of the line `mark` sits on.
    pub fn line_end_column(&self, mark: Mark) -> u32 {
        let index = mark.line.saturating_sub(1) as usize;
        self.line_ends
            .get(index)
            .copied()
            .unwrap_or(mark.column)
            .max(mark.column)
    }

    // ─────────────────────────────────────────────────────────────
    // Matching
    // ─────────────────────────────────────────────────────────────

    /// If the next character is `expected`, consume it.
    pub fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True if the input at the cursor starts with `literal`.
    pub fn check_literal(&self, literal: &str) -> bool {
        literal
            .chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    /// If the input at the cursor starts with `literal`, consume it.
    pub fn consume_literal(&mut self, literal: &str) -> bool {
        if !self.check_literal(literal) {
            return false;
        }
        for _ in literal.chars() {
            self.advance();
        }
        true
    }

    /// True if the input at the cursor is exactly the word `word`, not a
    /// prefix of a longer word.
    pub fn check_word(&self, word: &str) -> bool {
        let len = word.chars().count();
        self.check_literal(word) && !self.peek_at(len).is_some_and(is_word_char)
    }

    /// Consume `word` if [`Cursor::check_word`] holds.
    pub fn consume_word(&mut self, word: &str) -> bool {
        if self.check_word(word) {
            self.consume_literal(word)
        } else {
            false
        }
    }

    /// The longest run of word characters at the cursor, without consuming it.
    pub fn peek_word(&self) -> Option<String> {
        let word: String = self.chars[self.pos.min(self.chars.len())..]
            .iter()
            .take_while(|&&c| is_word_char(c))
            .collect();
        (!word.is_empty()).then_some(word)
    }

    /// Consume characters while `pred` holds and return them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            out.push(ch);
            self.advance();
        }
        out
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip spaces, tabs, line breaks and `#` comments.
    pub fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Skip spaces and tabs only, staying on the current line.
    pub fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines() {
        let mut c = Cursor::new("ab\ncd");
        assert_eq!(c.advance(), Some('a'));
        assert_eq!(c.advance(), Some('b'));
        assert_eq!(c.position(), Position::new(1, 3));
        assert_eq!(c.advance(), Some('\n'));
        assert_eq!(c.position(), Position::new(2, 1));
        c.advance();
        c.advance();
        assert_eq!(c.advance(), None);
        assert!(c.at_end());
    }

    #[test]
    fn test_columns_count_chars() {
        let mut c = Cursor::new("éa");
        c.advance();
        assert_eq!(c.column(), 2);
        assert_eq!(c.peek(), Some('a'));
    }

    #[test]
    fn test_mark_and_reset() {
        let mut c = Cursor::new("one\ntwo");
        let m = c.mark();
        c.take_while(|_| true);
        assert_eq!(c.line(), 2);
        c.reset(m);
        assert_eq!(c.position(), Position::new(1, 1));
        assert_eq!(c.peek(), Some('o'));
    }

    #[test]
    fn test_line_end_column_per_line() {
        let mut c = Cursor::new("ab\r\nlonger line\n\nx");
        c.take_while(|ch| ch != 'g');
        assert_eq!(c.line(), 2);
        assert_eq!(c.line_end_column(c.mark()), 12);
        let start = Cursor::new("ab\r\nx");
        assert_eq!(start.line_end_column(start.mark()), 3);
        c.take_while(|ch| ch != 'x');
        assert_eq!(c.line(), 4);
        assert_eq!(c.line_end_column(c.mark()), 2);
    }

    #[test]
    fn test_line_end_column() {
        let mut c = Cursor::new("abc = x\nnext");
        c.consume_literal("abc");
        let m = c.mark();
        assert_eq!(c.line_end_column(m), 8);
    }
}
