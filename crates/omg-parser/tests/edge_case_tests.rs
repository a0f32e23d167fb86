//! Edge cases and tree invariants.
//!
//! Covers:
//! 1. The minimal documents every consumer depends on
//! 2. Determinism, span containment and position lookup over a corpus
//! 3. Error messages and recovery to the next rule
//! 4. Inputs that must never take the parser down

use std::time::{Duration, Instant};

use omg_parser::{parse, MAX_ERRORS, MAX_NESTING_DEPTH};
use omg_types::{find_node_at, find_nodes_of_type, walk, NodeKind};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn error_messages(source: &str) -> Vec<String> {
    parse(source).errors.into_iter().map(|e| e.message).collect()
}

fn error_count(source: &str) -> usize {
    parse(source).errors.len()
}

const CORPUS: &[&str] = &[
    "version 1.0",
    "import \"names.txt\" as names",
    "import \"names.txt\" as names with word-boundary\nfoo = [[names]]",
    "bad = [[names]]+",
    "r = [[x]]{2,}",
    "r = (unterminated",
    "greeting = (hello | hi) \"there\"? [[names:starts(\"A\")]] uses fuzzy(threshold=\"0.8\") with ignore-case",
    "a = x\n    y z\nb = (?P<cap>[a-z]{1,3}) $",
    "resolver default uses local exact with optional-tokens(\"t.txt\")\nr = ^ \\w . \"s\"",
    "# comment only",
    "r = [abc\ns = x",
    "r = \u{00e9}t\u{00e9} = x",
];

// ─────────────────────────────────────────────────────────────────────
// Minimal documents
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_version_only() {
    let result = parse("version 1.0");
    assert!(result.errors.is_empty());
    assert_eq!(result.ast.kind, NodeKind::Root);
    assert_eq!(result.ast.children.len(), 1);
    let stmt = &result.ast.children[0];
    assert_eq!(stmt.kind, NodeKind::VersionStmt);
    assert_eq!(stmt.children[0].kind, NodeKind::VersionLiteral);
    assert_eq!(stmt.children[0].text_value(), Some("1.0"));
}

#[test]
fn test_import_only() {
    let result = parse("import \"names.txt\" as names");
    assert!(result.errors.is_empty());
    let import = &result.ast.children[0];
    assert_eq!(import.kind, NodeKind::ImportStmt);
    assert_eq!(import.children.len(), 2);
    assert_eq!(import.children[0].kind, NodeKind::String);
    assert_eq!(import.children[0].text_value(), Some("\"names.txt\""));
    assert_eq!(import.children[1].kind, NodeKind::Identifier);
    assert_eq!(import.children[1].text_value(), Some("names"));
}

#[test]
fn test_list_match_rule() {
    let result = parse("foo = [[names]]");
    assert!(result.errors.is_empty());
    let lists = find_nodes_of_type(&result.ast, NodeKind::ListMatch);
    assert_eq!(lists.len(), 1);
    let name = &lists[0].children[0];
    assert_eq!(name.text_value(), Some("names"));
    assert_eq!((name.span.line, name.span.column, name.span.length), (1, 9, 5));
}

#[test]
fn test_open_ended_plus_stops_silently() {
    let result = parse("bad = [[names]]+");
    assert!(result.errors.is_empty());
    assert_eq!(result.ast.children.len(), 1);
    let rule = &result.ast.children[0];
    assert_eq!(rule.kind, NodeKind::RuleDef);
    assert_eq!(rule.children[1].kind, NodeKind::ListMatch);
}

#[test]
fn test_unbounded_range_is_a_node() {
    let result = parse("r = [[x]]{2,}");
    assert!(result.errors.is_empty());
    let quantified = &result.ast.children[0].children[1];
    assert_eq!(quantified.kind, NodeKind::Quantified);
    let range = &quantified.children[1];
    assert_eq!(range.kind, NodeKind::Range);
    assert_eq!(range.children.len(), 1);
    assert_eq!(range.children[0].number_value(), Some(2));
}

#[test]
fn test_unterminated_group() {
    let result = parse("r = (unterminated");
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Expected closing parenthesis"]);
    let rule = &result.ast.children[0];
    assert_eq!(rule.kind, NodeKind::RuleDef);
    assert_eq!(rule.children[0].text_value(), Some("r"));
}

// ─────────────────────────────────────────────────────────────────────
// Invariants
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_parse_is_deterministic() {
    for source in CORPUS {
        let first = parse(source);
        for _ in 0..5 {
            assert_eq!(parse(source), first, "non-deterministic parse of {source:?}");
        }
    }
}

#[test]
fn test_children_within_parent_span() {
    for source in CORPUS {
        let result = parse(source);
        walk(&result.ast, &mut |node, _| {
            for child in &node.children {
                assert!(
                    child.span.line >= node.span.line,
                    "{:?} starts before its parent {:?} in {source:?}",
                    child.kind,
                    node.kind
                );
                if child.span.line == node.span.line {
                    assert!(
                        node.span.encloses(&child.span),
                        "{:?} {} escapes {:?} {} in {source:?}",
                        child.kind,
                        child.span,
                        node.kind,
                        node.span
                    );
                }
            }
        });
    }
}

#[test]
fn test_find_node_at_returns_deepest() {
    for source in CORPUS {
        let result = parse(source);
        let mut leaves = Vec::new();
        walk(&result.ast, &mut |node, _| {
            if node.children.is_empty() && node.span.length > 0 {
                leaves.push(node.span);
            }
        });
        for span in leaves {
            for column in span.column..span.end_column() {
                let found = find_node_at(&result.ast, span.line, column)
                    .unwrap_or_else(|| panic!("nothing at {}:{column} in {source:?}", span.line));
                assert!(found.span.contains(span.line, column));
                assert!(
                    found
                        .children
                        .iter()
                        .all(|c| !c.span.contains(span.line, column)),
                    "a child of {:?} also covers {}:{column}",
                    found.kind,
                    span.line
                );
            }
        }
    }
}

#[test]
fn test_find_node_at_on_later_line() {
    let result = parse("a = x\n    y");
    let found = find_node_at(&result.ast, 2, 5).unwrap();
    assert_eq!(found.text_value(), Some("y"));
}

// ─────────────────────────────────────────────────────────────────────
// Errors and recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_error_messages() {
    let cases: &[(&str, &str)] = &[
        ("version", "Expected version number after 'version'"),
        ("import names.txt as n", "Expected file path string after 'import'"),
        ("import \"a.txt\" names", "Expected 'as' after import path"),
        ("import \"a.txt\" as", "Expected alias name after 'as'"),
        ("import \"a.txt\" as a with bogus", "Unknown import flag 'bogus'"),
        ("resolver default exact", "Expected 'uses' after 'resolver default'"),
        ("r x", "Expected '=' after rule name 'r'"),
        ("r =", "Expected expression after '=' in rule 'r'"),
        ("r = x |", "Expected expression after '|'"),
        ("r = x{a}", "Expected number in quantifier"),
        ("r = x{2", "Expected '}' to close quantifier"),
        ("r = ()", "Expected expression after '('"),
        ("r = (?P<>x)", "Expected capture name after '(?P<'"),
        ("r = (?P<n x)", "Expected '>' after capture name"),
        ("r = [[]]", "Expected list name after '[['"),
        ("r = [[names", "Expected ']]' to close list match"),
        ("r = [[names:]]", "Expected filter name after ':'"),
        ("r = [[names:starts]]", "Expected '(' after filter name"),
        ("r = [[names:starts()]]", "Expected string argument for filter"),
        ("r = [abc", "Expected ']' to close character class"),
        ("r = \"abc", "Unterminated string literal"),
        ("r = x\\", "Incomplete escape sequence"),
        ("r = x uses", "Expected resolver method name after 'uses'"),
        ("r = x uses exact with loud", "Unknown resolver flag 'loud'"),
        ("r = x uses fuzzy(", "Expected resolver argument"),
    ];
    for (source, expected) in cases {
        let messages = error_messages(source);
        assert_eq!(
            messages.first().map(String::as_str),
            Some(*expected),
            "source {source:?} gave {messages:?}"
        );
    }
}

#[test]
fn test_recovery_resumes_at_next_rule() {
    let result = parse("a = (x\nb = y\nc = [[z\nd = w");
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["Expected closing parenthesis", "Expected ']]' to close list match"]
    );
    let names: Vec<&str> = result
        .ast
        .children
        .iter()
        .filter_map(|rule| rule.children[0].text_value())
        .collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    assert_eq!(result.errors[0].line(), 1);
    assert_eq!(result.errors[1].line(), 3);
}

#[test]
fn test_missing_equals_skips_line() {
    let result = parse("c x\nd = z");
    assert_eq!(error_messages("c x\nd = z"), vec!["Expected '=' after rule name 'c'"]);
    assert_eq!(result.ast.children.len(), 2);
    assert_eq!(result.ast.children[1].children[0].text_value(), Some("d"));
}

#[test]
fn test_following_line_continues_expression() {
    let result = parse("b = y\nc x\nd = z");
    assert!(result.errors.is_empty());
    let b = &result.ast.children[0].children[1];
    assert_eq!(b.kind, NodeKind::Concat);
    assert_eq!(b.children.len(), 3);
}

#[test]
fn test_bad_import_does_not_swallow_rule() {
    let result = parse("import \"a.txt\" as\nr = x");
    assert_eq!(error_count("import \"a.txt\" as\nr = x"), 1);
    assert_eq!(result.errors[0].line(), 1);
    assert_eq!(result.ast.children.len(), 2);
    assert_eq!(result.ast.children[1].kind, NodeKind::RuleDef);
}

#[test]
fn test_bad_resolver_default_does_not_swallow_rule() {
    let result = parse("resolver default\nr = x");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line(), 1);
    assert_eq!(result.ast.children[1].kind, NodeKind::RuleDef);
}

#[test]
fn test_empty_resolver_flags_leave_next_rule() {
    let result = parse("a = x uses exact with\nb = a");
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Expected resolver flag after 'with'"]);
    assert_eq!(result.errors[0].line(), 1);
    let rules = find_nodes_of_type(&result.ast, NodeKind::RuleDef);
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[1].children[0].text_value(), Some("b"));
    assert!(find_nodes_of_type(&result.ast, NodeKind::ResolverFlag).is_empty());
}

#[test]
fn test_trailing_comma_in_resolver_flags_leaves_next_rule() {
    let source = "a = x uses exact with ignore-case,\nb = a";
    assert_eq!(error_messages(source), vec!["Expected resolver flag after 'with'"]);
    let result = parse(source);
    assert_eq!(find_nodes_of_type(&result.ast, NodeKind::RuleDef).len(), 2);
    assert_eq!(find_nodes_of_type(&result.ast, NodeKind::ResolverFlag).len(), 1);
}

#[test]
fn test_empty_import_flags_leave_next_rule() {
    let result = parse("import \"a.txt\" as a with\nb = a");
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Expected import flag after 'with'"]);
    assert_eq!(result.errors[0].line(), 1);
    let kinds: Vec<NodeKind> = result.ast.children.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![NodeKind::ImportStmt, NodeKind::RuleDef]);
    assert_eq!(result.ast.children[1].children[0].text_value(), Some("b"));
}

#[test]
fn test_flags_may_continue_on_next_line() {
    let result = parse("a = x uses exact with\n    ignore-case\nb = a");
    assert!(result.errors.is_empty());
    assert_eq!(find_nodes_of_type(&result.ast, NodeKind::ResolverFlag).len(), 1);
    assert_eq!(find_nodes_of_type(&result.ast, NodeKind::RuleDef).len(), 2);
}

#[test]
fn test_error_cap() {
    let source = "x = (\n".repeat(MAX_ERRORS * 2);
    let result = parse(&source);
    assert_eq!(result.errors.len(), MAX_ERRORS);
}

// ─────────────────────────────────────────────────────────────────────
// Robustness
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_and_blank_input() {
    for source in ["", "   ", "\n\n\t\n", "# nothing here"] {
        let result = parse(source);
        assert_eq!(result.ast.kind, NodeKind::Root);
        assert!(result.ast.children.is_empty());
        assert!(result.errors.is_empty());
    }
}

#[test]
fn test_garbage_input() {
    let inputs = [
        "\u{0}\u{1}\u{7f}",
        "}}}]]]))",
        "= = =",
        "((((",
        "[[[[",
        "\"\"\"\"\"",
        "r = \u{fffd}\u{1f600}",
        "\\\\\\",
        "r = {{{",
    ];
    for source in inputs {
        let result = parse(source);
        assert_eq!(result.ast.kind, NodeKind::Root, "input {source:?}");
    }
}

#[test]
fn test_deep_nesting_reports_once() {
    let source = format!("r = {}", "(".repeat(10_000));
    let result = parse(&source);
    let expected = format!("Expression nesting too deep (maximum depth is {MAX_NESTING_DEPTH})");
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec![expected.as_str()]);
    assert_eq!(result.ast.children[0].kind, NodeKind::RuleDef);
}

#[test]
fn test_balanced_nesting_within_limit() {
    let depth = (MAX_NESTING_DEPTH - 2) as usize;
    let source = format!("r = {}x{}", "(".repeat(depth), ")".repeat(depth));
    let result = parse(&source);
    assert!(result.errors.is_empty());
    assert_eq!(
        find_nodes_of_type(&result.ast, NodeKind::GroupExpr).len(),
        depth
    );
}

#[test]
fn test_long_lines_parse_quickly() {
    let wide = format!("r = {}", "x ".repeat(50_000));
    let nested = format!("r = {}", "(".repeat(50_000));
    let continued = format!("r = {}\n y", "x | ".repeat(20_000));
    let started = Instant::now();
    for source in [&wide, &nested, &continued] {
        let result = parse(source);
        assert_eq!(result.ast.children[0].kind, NodeKind::RuleDef);
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}
