//! Raw-text classification shared by the fallback passes.
//!
//! The parser stops silently at characters it cannot use, so some problems
//! never reach the tree. The fallback passes look at the source lines
//! directly; this module tells them which characters are live pattern code
//! and which sit inside a string, a comment, a character class or a list
//! match.

use omg_types::SourceFile;

/// What a character belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Live pattern or statement text.
    Code,
    /// The character following a backslash.
    Escaped,
    /// Inside a double-quoted string, quotes included.
    String,
    /// From `#` to the end of the line.
    Comment,
    /// Inside `[...]`, brackets included.
    CharClass,
    /// Inside `[[...]]`, brackets included.
    ListMatch,
}

/// One classified character of a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedChar {
    pub ch: char,
    /// 1-based character column.
    pub column: u32,
    /// Byte offset within the line.
    pub offset: usize,
    pub region: Region,
}

/// A classified source line.
#[derive(Debug, Clone)]
pub struct ScannedLine {
    pub number: u32,
    pub chars: Vec<ScannedChar>,
}

impl ScannedLine {
    /// Region of the character starting at byte `offset`, if any.
    pub fn region_at_offset(&self, offset: usize) -> Option<Region> {
        self.chars
            .iter()
            .find(|c| c.offset == offset)
            .map(|c| c.region)
    }
}

/// Classify every line of `source`.
pub fn scan(source: &SourceFile) -> Vec<ScannedLine> {
    source
        .lines()
        .map(|(number, text)| ScannedLine {
            number,
            chars: classify_line(text),
        })
        .collect()
}

/// Classify one line. Strings, classes and list matches never continue
/// onto the next line, so each line is scanned independently.
pub fn classify_line(line: &str) -> Vec<ScannedChar> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;

    let push = |out: &mut Vec<ScannedChar>, idx: usize, region: Region| {
        let (offset, ch) = chars[idx];
        out.push(ScannedChar {
            ch,
            column: idx as u32 + 1,
            offset,
            region,
        });
    };

    while i < chars.len() {
        let ch = chars[i].1;
        let next = chars.get(i + 1).map(|&(_, c)| c);
        match ch {
            '#' => {
                while i < chars.len() {
                    push(&mut out, i, Region::Comment);
                    i += 1;
                }
            }
            '\\' => {
                push(&mut out, i, Region::Code);
                i += 1;
                if i < chars.len() {
                    push(&mut out, i, Region::Escaped);
                    i += 1;
                }
            }
            '"' => {
                push(&mut out, i, Region::String);
                i += 1;
                while i < chars.len() {
                    let c = chars[i].1;
                    push(&mut out, i, Region::String);
                    i += 1;
                    if c == '\\' && i < chars.len() {
                        push(&mut out, i, Region::String);
                        i += 1;
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '[' if next == Some('[') => {
                while i < chars.len() {
                    let closing = chars[i].1 == ']' && chars.get(i + 1).map(|&(_, c)| c) == Some(']');
                    push(&mut out, i, Region::ListMatch);
                    i += 1;
                    if closing {
                        push(&mut out, i, Region::ListMatch);
                        i += 1;
                        break;
                    }
                }
            }
            '[' => {
                push(&mut out, i, Region::CharClass);
                i += 1;
                while i < chars.len() {
                    let c = chars[i].1;
                    push(&mut out, i, Region::CharClass);
                    i += 1;
                    if c == '\\' && i < chars.len() {
                        push(&mut out, i, Region::CharClass);
                        i += 1;
                    } else if c == ']' {
                        break;
                    }
                }
            }
            _ => {
                push(&mut out, i, Region::Code);
                i += 1;
            }
        }
    }
    out
}
