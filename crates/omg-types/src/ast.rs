//! AST node types for the OMG pattern language.
//!
//! The tree is a single generic node shape tagged by [`NodeKind`]. Child order
//! is meaningful: the first child of a `rule_def` is always the rule name, the
//! second child of an `import_stmt` is always the alias. Every node carries a
//! [`SourceSpan`]; nodes own their children and hold no parent links.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SourceSpan;

// ══════════════════════════════════════════════════════════════════════════════
// Node kinds
// ══════════════════════════════════════════════════════════════════════════════

/// Tag identifying what grammar production a node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    VersionStmt,
    VersionLiteral,
    ImportStmt,
    ImportOpts,
    ImportFlag,
    ResolverDefault,
    ResolverScope,
    RuleDef,
    UsesClause,
    ResolverMethod,
    ResolverArgList,
    ResolverArg,
    ResolverWith,
    ResolverFlag,
    OptionalTokensClause,
    Alt,
    Concat,
    Quantified,
    GroupExpr,
    NamedCapture,
    ListMatch,
    FilterExpr,
    Qmark,
    ExactRange,
    Range,
    Escape,
    Anchor,
    Dot,
    Charclass,
    CharRange,
    Char,
    String,
    Identifier,
    Number,
}

impl NodeKind {
    /// Every node kind, in declaration order.
    pub const ALL: [NodeKind; 35] = [
        NodeKind::Root,
        NodeKind::VersionStmt,
        NodeKind::VersionLiteral,
        NodeKind::ImportStmt,
        NodeKind::ImportOpts,
        NodeKind::ImportFlag,
        NodeKind::ResolverDefault,
        NodeKind::ResolverScope,
        NodeKind::RuleDef,
        NodeKind::UsesClause,
        NodeKind::ResolverMethod,
        NodeKind::ResolverArgList,
        NodeKind::ResolverArg,
        NodeKind::ResolverWith,
        NodeKind::ResolverFlag,
        NodeKind::OptionalTokensClause,
        NodeKind::Alt,
        NodeKind::Concat,
        NodeKind::Quantified,
        NodeKind::GroupExpr,
        NodeKind::NamedCapture,
        NodeKind::ListMatch,
        NodeKind::FilterExpr,
        NodeKind::Qmark,
        NodeKind::ExactRange,
        NodeKind::Range,
        NodeKind::Escape,
        NodeKind::Anchor,
        NodeKind::Dot,
        NodeKind::Charclass,
        NodeKind::CharRange,
        NodeKind::Char,
        NodeKind::String,
        NodeKind::Identifier,
        NodeKind::Number,
    ];

    /// The snake_case tag used in serialized trees and by tooling.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::VersionStmt => "version_stmt",
            NodeKind::VersionLiteral => "version_literal",
            NodeKind::ImportStmt => "import_stmt",
            NodeKind::ImportOpts => "import_opts",
            NodeKind::ImportFlag => "import_flag",
            NodeKind::ResolverDefault => "resolver_default",
            NodeKind::ResolverScope => "resolver_scope",
            NodeKind::RuleDef => "rule_def",
            NodeKind::UsesClause => "uses_clause",
            NodeKind::ResolverMethod => "resolver_method",
            NodeKind::ResolverArgList => "resolver_arg_list",
            NodeKind::ResolverArg => "resolver_arg",
            NodeKind::ResolverWith => "resolver_with",
            NodeKind::ResolverFlag => "resolver_flag",
            NodeKind::OptionalTokensClause => "optional_tokens_clause",
            NodeKind::Alt => "alt",
            NodeKind::Concat => "concat",
            NodeKind::Quantified => "quantified",
            NodeKind::GroupExpr => "group_expr",
            NodeKind::NamedCapture => "named_capture",
            NodeKind::ListMatch => "list_match",
            NodeKind::FilterExpr => "filter_expr",
            NodeKind::Qmark => "qmark",
            NodeKind::ExactRange => "exact_range",
            NodeKind::Range => "range",
            NodeKind::Escape => "escape",
            NodeKind::Anchor => "anchor",
            NodeKind::Dot => "dot",
            NodeKind::Charclass => "charclass",
            NodeKind::CharRange => "char_range",
            NodeKind::Char => "char",
            NodeKind::String => "string",
            NodeKind::Identifier => "identifier",
            NodeKind::Number => "number",
        }
    }

    /// Look a kind up by its snake_case tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Nodes
// ══════════════════════════════════════════════════════════════════════════════

/// Literal payload carried by leaf-like nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    Text(String),
    Number(u64),
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Text(s) => f.write_str(s),
            NodeValue::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A positioned syntax tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
    pub span: SourceSpan,
}

impl AstNode {
    /// A node with neither value nor children.
    pub fn new(kind: NodeKind, span: SourceSpan) -> Self {
        Self {
            kind,
            value: None,
            children: Vec::new(),
            span,
        }
    }

    /// A leaf carrying a text payload.
    pub fn text(kind: NodeKind, text: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            kind,
            value: Some(NodeValue::Text(text.into())),
            children: Vec::new(),
            span,
        }
    }

    /// A `number` leaf.
    pub fn number(value: u64, span: SourceSpan) -> Self {
        Self {
            kind: NodeKind::Number,
            value: Some(NodeValue::Number(value)),
            children: Vec::new(),
            span,
        }
    }

    /// An interior node owning `children`.
    pub fn branch(kind: NodeKind, children: Vec<AstNode>, span: SourceSpan) -> Self {
        Self {
            kind,
            value: None,
            children,
            span,
        }
    }

    /// The empty tree returned when nothing could be parsed.
    pub fn empty_root() -> Self {
        Self::new(NodeKind::Root, SourceSpan::point(1, 1))
    }

    /// Attach a text payload.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.value = Some(NodeValue::Text(text.into()));
        self
    }

    /// The text payload, if this node carries one.
    pub fn text_value(&self) -> Option<&str> {
        match &self.value {
            Some(NodeValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The numeric payload, if this node carries one.
    pub fn number_value(&self) -> Option<u64> {
        match self.value {
            Some(NodeValue::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn child(&self, index: usize) -> Option<&AstNode> {
        self.children.get(index)
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(AstNode::node_count).sum::<usize>()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Strip one pair of surrounding double quotes from a string literal.
pub fn unquote(literal: &str) -> &str {
    literal
        .strip_prefix('"')
        .map(|s| s.strip_suffix('"').unwrap_or(s))
        .unwrap_or(literal)
}
