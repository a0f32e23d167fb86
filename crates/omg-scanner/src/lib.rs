//! OMG scanner: a character cursor with line/column tracking.

pub mod cursor;

pub use cursor::{is_ident_start, is_word_char, Cursor, Mark};
