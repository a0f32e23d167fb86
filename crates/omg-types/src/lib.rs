//! Shared types for the OMG toolchain.
//!
//! This crate defines the AST node shape, source spans, parse errors and
//! diagnostics, plus the read-only tree queries used by every later stage.

mod error;
mod span;
pub mod ast;
pub mod query;

pub use ast::{unquote, AstNode, NodeKind, NodeValue};
pub use error::{Diagnostic, DiagnosticCode, ErrorCategory, ParseError, Severity, DIAGNOSTIC_SOURCE};
pub use query::{ancestors_at, find_node_at, find_nodes_of_type, has_ancestor_of_type, walk};
pub use span::{Position, SourceFile, SourceSpan};

/// Result of parsing one document: the tree plus syntax errors.
///
/// `ast` is always a `root` node, even when parsing failed outright.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParseResult {
    pub ast: AstNode,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Empty root with a single error, used when a parse cannot proceed.
    pub fn fallback(message: impl Into<String>) -> Self {
        Self {
            ast: AstNode::empty_root(),
            errors: vec![ParseError::new(message, SourceSpan::point(1, 1))],
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
