//! Read-only tree queries over a parsed OMG document.
//!
//! Navigation, completion and hover layers locate nodes through these
//! helpers. None of them mutate the tree, and ancestor information is
//! recovered from the traversal stack because nodes keep no parent links.

use crate::ast::{AstNode, NodeKind};

/// Deepest node whose span covers `(line, column)`.
///
/// Children are searched before their parent and in stored order, so an
/// inner node always wins over the node that contains it. Parent spans are
/// not used to prune the search: a multi-line construct is only spanned on
/// its first line, but its children may sit on later ones.
pub fn find_node_at(root: &AstNode, line: u32, column: u32) -> Option<&AstNode> {
    for child in &root.children {
        if let Some(found) = find_node_at(child, line, column) {
            return Some(found);
        }
    }
    root.span.contains(line, column).then_some(root)
}

/// Every node of the given kind, in pre-order (parent first, children in
/// stored order). The root is included when it matches.
pub fn find_nodes_of_type(root: &AstNode, kind: NodeKind) -> Vec<&AstNode> {
    let mut found = Vec::new();
    walk(root, &mut |node, _| {
        if node.kind == kind {
            found.push(node);
        }
    });
    found
}

/// Pre-order traversal handing each node its ancestor chain (outermost
/// first, not including the node itself).
pub fn walk<'a, F>(root: &'a AstNode, visit: &mut F)
where
    F: FnMut(&'a AstNode, &[&'a AstNode]),
{
    let mut stack = Vec::new();
    walk_inner(root, &mut stack, visit);
}

fn walk_inner<'a, F>(node: &'a AstNode, stack: &mut Vec<&'a AstNode>, visit: &mut F)
where
    F: FnMut(&'a AstNode, &[&'a AstNode]),
{
    visit(node, stack.as_slice());
    stack.push(node);
    for child in &node.children {
        walk_inner(child, stack, visit);
    }
    stack.pop();
}

/// Path from `root` down to the node [`find_node_at`] would return,
/// inclusive at both ends. Empty when nothing covers the position.
pub fn ancestors_at(root: &AstNode, line: u32, column: u32) -> Vec<&AstNode> {
    let mut path = Vec::new();
    if locate(root, line, column, &mut path) {
        path
    } else {
        Vec::new()
    }
}

fn locate<'a>(node: &'a AstNode, line: u32, column: u32, path: &mut Vec<&'a AstNode>) -> bool {
    path.push(node);
    for child in &node.children {
        if locate(child, line, column, path) {
            return true;
        }
    }
    if node.span.contains(line, column) {
        return true;
    }
    path.pop();
    false
}

/// True if the node at `(line, column)`, or any node above it, has `kind`.
pub fn has_ancestor_of_type(root: &AstNode, line: u32, column: u32, kind: NodeKind) -> bool {
    ancestors_at(root, line, column)
        .iter()
        .any(|node| node.kind == kind)
}
