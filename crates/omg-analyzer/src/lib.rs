//! OMG semantic validator.
//!
//! Runs the semantic passes over a parsed document and its source text:
//!
//! ```text
//! AST  ──► references ──┐
//!      ──► ranges     ──┤
//!      ──► file refs  ──┼──► de-duplicate ──► sort by position ──► Vec<Diagnostic>
//! text ──► open-ended ──┤
//!      ──► file refs  ──┘
//! ```
//!
//! The raw-text passes catch constructs the parser stopped in front of;
//! where both views see the same problem the duplicate is dropped.

pub mod cache;
pub mod config;
pub mod files;
pub mod quantifiers;
pub mod references;
pub mod text_scan;

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use omg_types::{AstNode, Diagnostic, ParseResult, SourceFile};

pub use cache::{CacheStats, CachedDocument, DocumentCache};
pub use config::{ConfigError, ConfigResult, ValidatorConfig, BUILTIN_RESOLVERS};
pub use files::{FileRef, FileRefKind, FileResolver};

/// Validate with the default configuration.
pub fn validate(ast: &AstNode, text: &str, base_dir: Option<&Path>) -> Vec<Diagnostic> {
    validate_with(ast, text, base_dir, &ValidatorConfig::default())
}

/// Run every enabled pass and return the diagnostics in source order.
pub fn validate_with(
    ast: &AstNode,
    text: &str,
    base_dir: Option<&Path>,
    config: &ValidatorConfig,
) -> Vec<Diagnostic> {
    let source = SourceFile::new("<document>", text);
    let lines = if config.raw_text_fallback {
        text_scan::scan(&source)
    } else {
        Vec::new()
    };

    let mut diagnostics = references::check_undefined_references(ast, config);
    let reference_count = diagnostics.len();

    diagnostics.extend(quantifiers::check_unbounded_ranges(ast));
    diagnostics.extend(quantifiers::check_open_ended(&lines));
    let quantifier_count = diagnostics.len() - reference_count;

    let resolver = FileResolver::new(base_dir);
    if config.check_files && resolver.base_dir().is_some() {
        let mut refs = files::collect_ast_refs(ast);
        if config.raw_text_fallback {
            refs.extend(files::collect_text_refs(&source, &lines));
        }
        diagnostics.extend(files::check_file_refs(&refs, &resolver));
    }
    let file_count = diagnostics.len() - reference_count - quantifier_count;

    debug!(
        references = reference_count,
        quantifiers = quantifier_count,
        files = file_count,
        "validation passes finished"
    );

    if config.deduplicate {
        diagnostics = deduplicate(diagnostics);
    }
    sort_by_position(&mut diagnostics);
    diagnostics
}

/// Drop diagnostics repeating an earlier one's span, code and message.
pub fn deduplicate(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| seen.insert((d.span, d.code, d.message.clone())))
        .collect()
}

/// Stable sort by (line, column); ties keep pass order.
pub fn sort_by_position(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| (d.span.line, d.span.column));
}

// ══════════════════════════════════════════════════════════════════════════════
// Whole-document analysis
// ══════════════════════════════════════════════════════════════════════════════

/// Parse result plus every diagnostic for one document.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub parse: ParseResult,
    /// Syntax errors and semantic diagnostics, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Parse and validate `text` with the default configuration.
pub fn analyze(text: &str, base_dir: Option<&Path>) -> Analysis {
    analyze_with(text, base_dir, &ValidatorConfig::default())
}

pub fn analyze_with(text: &str, base_dir: Option<&Path>, config: &ValidatorConfig) -> Analysis {
    let parse = omg_parser::parse(text);
    let diagnostics = diagnostics_for(&parse, text, base_dir, config);
    Analysis { parse, diagnostics }
}

/// Syntax errors of `parse` merged with the semantic diagnostics.
pub(crate) fn diagnostics_for(
    parse: &ParseResult,
    text: &str,
    base_dir: Option<&Path>,
    config: &ValidatorConfig,
) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = parse.errors.iter().map(Diagnostic::from).collect();
    diagnostics.extend(validate_with(&parse.ast, text, base_dir, config));
    sort_by_position(&mut diagnostics);
    diagnostics
}
