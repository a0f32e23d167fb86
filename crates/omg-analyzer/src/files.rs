//! File reference checks for imports and `optional-tokens`.
//!
//! Paths are resolved against the directory of the document being
//! validated. Without a base directory nothing can be verified and the
//! checks produce no diagnostics.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use omg_types::{unquote, walk, AstNode, Diagnostic, DiagnosticCode, NodeKind, SourceFile, SourceSpan};

use crate::text_scan::{Region, ScannedLine};

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*import\s+("[^"\n]*")"#).expect("valid import regex"));

static OPTIONAL_TOKENS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"optional-tokens\s*\(([^)]*)\)").expect("valid optional-tokens regex"));

static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"\n]*""#).expect("valid string regex"));

/// Which statement a file path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRefKind {
    Import,
    OptionalTokens,
}

impl FileRefKind {
    pub fn code(self) -> DiagnosticCode {
        match self {
            FileRefKind::Import => DiagnosticCode::MissingImportFile,
            FileRefKind::OptionalTokens => DiagnosticCode::MissingOptionalTokensFile,
        }
    }

    fn message(self, path: &str) -> String {
        match self {
            FileRefKind::Import => format!("Import file not found: {path}"),
            FileRefKind::OptionalTokens => format!("Optional-tokens file not found: {path}"),
        }
    }
}

/// A quoted path literal found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub kind: FileRefKind,
    /// The literal as written, quotes included.
    pub literal: String,
    pub span: SourceSpan,
}

/// Resolves path literals against a document directory.
#[derive(Debug, Clone, Default)]
pub struct FileResolver {
    base_dir: Option<PathBuf>,
}

impl FileResolver {
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Strip the quotes from `literal` and join it onto the base directory.
    pub fn resolve(&self, literal: &str) -> Option<PathBuf> {
        let base = self.base_dir.as_ref()?;
        Some(base.join(unquote(literal)))
    }

    /// `Some(true)` if the file exists, `Some(false)` if it definitely does
    /// not, `None` if it cannot be checked.
    pub fn exists(&self, literal: &str) -> Option<bool> {
        let path = self.resolve(literal)?;
        match path.try_exists() {
            Ok(found) => Some(found && path.is_file()),
            Err(err) => {
                trace!(path = %path.display(), error = %err, "cannot verify file reference");
                None
            }
        }
    }
}

fn is_complete_literal(literal: &str) -> bool {
    literal.len() >= 2 && literal.starts_with('"') && literal.ends_with('"')
}

/// File references found in the tree.
pub fn collect_ast_refs(root: &AstNode) -> Vec<FileRef> {
    let mut refs = Vec::new();
    for stmt in root.children.iter().filter(|n| n.is(NodeKind::ImportStmt)) {
        if let Some(path) = stmt.child(0).filter(|n| n.is(NodeKind::String)) {
            push_ref(&mut refs, FileRefKind::Import, path);
        }
    }
    walk(root, &mut |node, _| {
        let is_optional_tokens = node.is(NodeKind::ResolverFlag)
            && node.text_value().is_some_and(|v| v.contains("optional-tokens"));
        if !is_optional_tokens {
            return;
        }
        walk(node, &mut |inner, _| {
            if inner.is(NodeKind::String) {
                push_ref(&mut refs, FileRefKind::OptionalTokens, inner);
            }
        });
    });
    refs
}

fn push_ref(refs: &mut Vec<FileRef>, kind: FileRefKind, node: &AstNode) {
    if let Some(literal) = node.text_value() {
        refs.push(FileRef {
            kind,
            literal: literal.to_string(),
            span: node.span,
        });
    }
}

/// File references found by matching the raw lines, for statements the
/// parser never reached. Matches inside strings or comments are ignored.
pub fn collect_text_refs(source: &SourceFile, lines: &[ScannedLine]) -> Vec<FileRef> {
    let mut refs = Vec::new();
    for scanned in lines {
        let Some(text) = source.line(scanned.number) else {
            continue;
        };
        let in_code = |offset: usize| scanned.region_at_offset(offset) == Some(Region::Code);

        if let Some(caps) = IMPORT_RE.captures(text) {
            if let Some(path) = caps.get(1) {
                if let Some(span) = source.span_for_bytes(scanned.number, path.start(), path.end()) {
                    refs.push(FileRef {
                        kind: FileRefKind::Import,
                        literal: path.as_str().to_string(),
                        span,
                    });
                }
            }
        }

        for caps in OPTIONAL_TOKENS_RE.captures_iter(text) {
            let (Some(whole), Some(args)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if !in_code(whole.start()) {
                continue;
            }
            for file in STRING_RE.find_iter(args.as_str()) {
                let start = args.start() + file.start();
                let end = args.start() + file.end();
                if let Some(span) = source.span_for_bytes(scanned.number, start, end) {
                    refs.push(FileRef {
                        kind: FileRefKind::OptionalTokens,
                        literal: file.as_str().to_string(),
                        span,
                    });
                }
            }
        }
    }
    refs
}

/// Report every reference whose file is known to be missing.
pub fn check_file_refs(refs: &[FileRef], resolver: &FileResolver) -> Vec<Diagnostic> {
    refs.iter()
        .filter(|r| is_complete_literal(&r.literal))
        .filter_map(|r| {
            if resolver.exists(&r.literal)? {
                return None;
            }
            let path = unquote(&r.literal);
            let mut diag = Diagnostic::error(r.kind.code(), r.kind.message(path), r.span);
            if let Some(resolved) = resolver.resolve(&r.literal) {
                diag = diag.with_suggestion(format!("looked for {}", resolved.display()));
            }
            Some(diag)
        })
        .collect()
}
