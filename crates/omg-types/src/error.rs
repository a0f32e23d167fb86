use crate::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag placed in [`Diagnostic::source`] for everything this toolchain emits.
pub const DIAGNOSTIC_SOURCE: &str = "omg";

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Broad grouping of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Reference,
    Quantifier,
    Resource,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Reference => write!(f, "reference"),
            Self::Quantifier => write!(f, "quantifier"),
            Self::Resource => write!(f, "resource"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Stable machine-readable diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    SyntaxError,
    InternalError,
    UndefinedReference,
    UnboundedQuantifier,
    OpenEndedQuantifier,
    MissingImportFile,
    MissingOptionalTokensFile,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SyntaxError => "syntax-error",
            Self::InternalError => "internal-error",
            Self::UndefinedReference => "undefined-reference",
            Self::UnboundedQuantifier => "unbounded-quantifier",
            Self::OpenEndedQuantifier => "open-ended-quantifier",
            Self::MissingImportFile => "missing-import-file",
            Self::MissingOptionalTokensFile => "missing-optional-tokens-file",
        }
    }

    /// Get the category for this code.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::SyntaxError => ErrorCategory::Syntax,
            Self::InternalError => ErrorCategory::Internal,
            Self::UndefinedReference => ErrorCategory::Reference,
            Self::UnboundedQuantifier | Self::OpenEndedQuantifier => ErrorCategory::Quantifier,
            Self::MissingImportFile | Self::MissingOptionalTokensFile => ErrorCategory::Resource,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syntax error recorded by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    #[serde(flatten)]
    pub span: SourceSpan,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }

    pub fn length(&self) -> u32 {
        self.span.length
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

impl std::error::Error for ParseError {}

/// A structured diagnostic, ready for an editor or a JSON consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub span: SourceSpan,
    pub message: String,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub source: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    /// Create an error-severity diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            span,
            message: message.into(),
            severity: Severity::Error,
            code,
            source: DIAGNOSTIC_SOURCE.to_string(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic::error(DiagnosticCode::SyntaxError, err.message.clone(), err.span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}] {}", self.span, self.code, self.category(), self.message)
    }
}
