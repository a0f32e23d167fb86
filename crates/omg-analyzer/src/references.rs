//! Undefined rule reference detection.
//!
//! A name is defined by a rule definition (its first child), by an import
//! alias (the second child of `import_stmt`), or by being a built-in
//! resolver method. Only identifiers in reference position are checked:
//! rule names, import aliases, capture names, resolver argument names and
//! filter names are the subjects of their constructs, not uses.

use std::collections::HashSet;

use omg_types::{walk, AstNode, Diagnostic, DiagnosticCode, NodeKind};

use crate::config::ValidatorConfig;

/// Names bound at the top level of the document.
pub fn defined_names(root: &AstNode) -> HashSet<&str> {
    let mut names = HashSet::new();
    for stmt in &root.children {
        let bound = match stmt.kind {
            NodeKind::RuleDef => stmt.child(0),
            NodeKind::ImportStmt => stmt.child(1),
            _ => None,
        };
        if let Some(name) = bound.filter(|n| n.is(NodeKind::Identifier)) {
            if let Some(text) = name.text_value() {
                names.insert(text);
            }
        }
    }
    names
}

/// True if `node`, a child of `parent`, is used as a reference.
fn is_reference_position(node: &AstNode, parent: &AstNode) -> bool {
    let is_first = parent
        .children
        .first()
        .is_some_and(|first| std::ptr::eq(first, node));
    match parent.kind {
        NodeKind::RuleDef | NodeKind::NamedCapture => !is_first,
        NodeKind::ImportStmt | NodeKind::ResolverArg | NodeKind::FilterExpr => false,
        _ => true,
    }
}

/// Every identifier in reference position, in document order.
pub fn reference_identifiers(root: &AstNode) -> Vec<&AstNode> {
    let mut refs = Vec::new();
    walk(root, &mut |node, ancestors| {
        if !node.is(NodeKind::Identifier) {
            return;
        }
        if let Some(parent) = ancestors.last() {
            if is_reference_position(node, parent) {
                refs.push(node);
            }
        }
    });
    refs
}

/// Report every reference to a name that is neither defined nor built in.
pub fn check_undefined_references(root: &AstNode, config: &ValidatorConfig) -> Vec<Diagnostic> {
    let defined = defined_names(root);
    reference_identifiers(root)
        .into_iter()
        .filter_map(|ident| {
            let name = ident.text_value()?;
            if defined.contains(name) || config.is_builtin(name) {
                return None;
            }
            Some(Diagnostic::error(
                DiagnosticCode::UndefinedReference,
                format!("Undefined rule reference: {name}"),
                ident.span,
            ))
        })
        .collect()
}
