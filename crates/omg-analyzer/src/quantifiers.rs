//! Unbounded quantifier detection.
//!
//! The grammar accepts `{n,}` so the error can point at the quantifier;
//! it is rejected here. `+` and `*` are not part of the grammar at all:
//! the parser stops in front of them without an error, so they are found
//! by scanning the source text.

use omg_types::{find_nodes_of_type, AstNode, Diagnostic, DiagnosticCode, NodeKind, SourceSpan};

use crate::text_scan::{Region, ScannedLine};

pub const UNBOUNDED_MESSAGE: &str = "Unbounded quantifiers are not allowed in OMG.";

/// `range` nodes with a minimum and no maximum.
pub fn check_unbounded_ranges(root: &AstNode) -> Vec<Diagnostic> {
    find_nodes_of_type(root, NodeKind::Range)
        .into_iter()
        .filter(|range| range.children.len() == 1)
        .map(|range| {
            let min = range.child(0).and_then(AstNode::number_value).unwrap_or(0);
            let max = min.saturating_add(1);
            Diagnostic::error(DiagnosticCode::UnboundedQuantifier, UNBOUNDED_MESSAGE, range.span)
                .with_suggestion(format!("give the range an upper bound, e.g. {{{min},{max}}}"))
        })
        .collect()
}

/// Characters after which `+` or `*` would quantify something.
fn is_quantifiable(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, ']' | ')' | '}' | '.')
}

fn bounded_replacement(op: char) -> &'static str {
    if op == '+' {
        "{1,n}"
    } else {
        "{0,n}"
    }
}

/// `+` and `*` in live code directly after something they could repeat.
pub fn check_open_ended(lines: &[ScannedLine]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for line in lines {
        for pair in line.chars.windows(2) {
            let (prev, op) = (pair[0], pair[1]);
            if op.region != Region::Code || !matches!(op.ch, '+' | '*') {
                continue;
            }
            if prev.region == Region::Comment || !is_quantifiable(prev.ch) {
                continue;
            }
            let span = SourceSpan::new(line.number, op.column, 1);
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::OpenEndedQuantifier,
                    format!("Open-ended quantifier '{}' is not allowed in OMG.", op.ch),
                    span,
                )
                .with_suggestion(format!(
                    "replace '{}' with a bounded quantifier such as {}",
                    op.ch,
                    bounded_replacement(op.ch)
                )),
            );
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_scan::scan;
    use omg_types::SourceFile;

    fn open_ended(source: &str) -> Vec<(u32, u32, String)> {
        let lines = scan(&SourceFile::new("test.omg", source));
        check_open_ended(&lines)
            .into_iter()
            .map(|d| (d.span.line, d.span.column, d.message))
            .collect()
    }

    #[test]
    fn test_plus_after_list_match() {
        let found = open_ended("bad = [[names]]+");
        assert_eq!(
            found,
            vec![(1, 16, "Open-ended quantifier '+' is not allowed in OMG.".to_string())]
        );
    }

    #[test]
    fn test_star_after_group_and_letter() {
        let found = open_ended("a = (x)*\nb = y*");
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].0, found[0].1), (1, 8));
        assert_eq!((found[1].0, found[1].1), (2, 6));
        assert!(found[1].2.contains("'*'"));
    }

    #[test]
    fn test_ignored_in_strings_classes_comments() {
        assert!(open_ended("a = \"x+\" [a+] # y+").is_empty());
        assert!(open_ended("a = \\d\\+").is_empty());
    }

    #[test]
    fn test_operator_needs_operand() {
        assert!(open_ended("a = x | +").is_empty());
        assert!(open_ended("+").is_empty());
    }

    #[test]
    fn test_unbounded_range_only() {
        let result = omg_parser::parse("a = x{2,}\nb = y{1,3}\nc = z{4}");
        let diags = check_unbounded_ranges(&result.ast);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, UNBOUNDED_MESSAGE);
        assert_eq!(diags[0].span.line, 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnboundedQuantifier);
    }
}
