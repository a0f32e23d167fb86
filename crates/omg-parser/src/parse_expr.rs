//! Pattern expression parsing.
//!
//! Precedence (lowest → highest):
//! 3. `|` alternation
//! 2. concatenation (juxtaposition)
//! 1. postfix quantifiers `?`, `{n}`, `{n,m}`, `{n,}`
//!
//! Primaries are an ordered choice decided by lookahead:
//! `(?P<` named capture, `(` group, `[[` list match, anything else an atom.
//! Once a lookahead commits, the parser never backtracks into another
//! alternative.

use omg_scanner::is_ident_start;
use omg_types::{AstNode, NodeKind};

use crate::parser::{Parser, MAX_NESTING_DEPTH};

impl Parser {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression starting at the cursor.
    ///
    /// Returns `None` without reporting when no expression starts here; the
    /// caller decides whether that is an error.
    pub(crate) fn parse_expression(&mut self) -> Option<AstNode> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            if !self.depth_reported {
                self.depth_reported = true;
                self.error_at_current(format!(
                    "Expression nesting too deep (maximum depth is {MAX_NESTING_DEPTH})"
                ));
            }
            self.depth -= 1;
            return None;
        }
        let result = self.parse_alternation();
        self.depth -= 1;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `alternation := concatenation ("|" concatenation)*`
    fn parse_alternation(&mut self) -> Option<AstNode> {
        let start = self.mark();
        let first = self.parse_concatenation()?;
        let mut branches = vec![first];
        while self.eat_after_whitespace('|') {
            let mark = self.mark();
            self.skip_whitespace();
            match self.parse_concatenation() {
                Some(branch) => branches.push(branch),
                None => {
                    self.reset(mark);
                    self.error_at_current("Expected expression after '|'");
                    break;
                }
            }
        }
        if branches.len() == 1 {
            return branches.pop();
        }
        let span = self.span_from(start);
        Some(AstNode::branch(NodeKind::Alt, branches, span))
    }

    /// `concatenation := quantified_expr+`
    ///
    /// Stops silently at the first character that cannot start a primary,
    /// at the `uses` keyword, and where a new rule definition begins.
    fn parse_concatenation(&mut self) -> Option<AstNode> {
        let start = self.mark();
        if self.at_expression_boundary() {
            return None;
        }
        let first = self.parse_quantified()?;
        let mut items = vec![first];
        loop {
            let mark = self.mark();
            self.skip_whitespace();
            if self.at_expression_boundary() {
                self.reset(mark);
                break;
            }
            match self.parse_quantified() {
                Some(item) => items.push(item),
                None => {
                    self.reset(mark);
                    break;
                }
            }
        }
        if items.len() == 1 {
            return items.pop();
        }
        let span = self.span_from(start);
        Some(AstNode::branch(NodeKind::Concat, items, span))
    }

    fn at_expression_boundary(&mut self) -> bool {
        self.at_keyword("uses") || self.at_rule_start()
    }

    /// `quantified_expr := primary quantifier?`
    fn parse_quantified(&mut self) -> Option<AstNode> {
        let start = self.mark();
        let primary = self.parse_primary()?;
        match self.parse_quantifier() {
            Some(quantifier) => {
                let span = self.span_from(start);
                Some(AstNode::branch(
                    NodeKind::Quantified,
                    vec![primary, quantifier],
                    span,
                ))
            }
            None => Some(primary),
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Quantifiers
    // ══════════════════════════════════════════════════════════════════════════

    /// `quantifier := "?" | "{" NUMBER "}" | "{" NUMBER "," NUMBER "}"`
    ///
    /// `{n,}` is accepted here as a single-child `range`; rejecting it is the
    /// validator's job, so tooling still gets a node to work with.
    fn parse_quantifier(&mut self) -> Option<AstNode> {
        let start = self.mark();
        if self.cursor_mut().consume('?') {
            return Some(AstNode::new(NodeKind::Qmark, self.span_from(start)));
        }
        if !self.cursor_mut().consume('{') {
            return None;
        }

        self.cursor_mut().skip_inline_whitespace();
        let Some(min) = self.parse_number() else {
            self.error_at_current("Expected number in quantifier");
            self.skip_to_quantifier_end();
            return None;
        };
        self.cursor_mut().skip_inline_whitespace();

        let (kind, bounds) = if self.cursor_mut().consume(',') {
            self.cursor_mut().skip_inline_whitespace();
            match self.parse_number() {
                Some(max) => (NodeKind::Range, vec![min, max]),
                None => (NodeKind::Range, vec![min]),
            }
        } else {
            (NodeKind::ExactRange, vec![min])
        };

        self.cursor_mut().skip_inline_whitespace();
        if !self.cursor_mut().consume('}') {
            self.error_at_current("Expected '}' to close quantifier");
        }
        let span = self.span_from(start);
        Some(AstNode::branch(kind, bounds, span))
    }

    /// Skip past the `}` of a malformed quantifier, staying on the line.
    fn skip_to_quantifier_end(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.cursor_mut().advance();
            if ch == '}' {
                break;
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primaries
    // ══════════════════════════════════════════════════════════════════════════

    /// `primary := group | named_capture | list_match | regex_atom`
    fn parse_primary(&mut self) -> Option<AstNode> {
        if self.cursor().check_literal("(?P<") {
            Some(self.parse_named_capture())
        } else if self.peek() == Some('(') {
            Some(self.parse_group())
        } else if self.cursor().check_literal("[[") {
            Some(self.parse_list_match())
        } else {
            self.parse_regex_atom()
        }
    }

    /// `group := "(" expression ")"`
    fn parse_group(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume('(');

        let mut children = Vec::new();
        let mark = self.mark();
        self.skip_whitespace();
        match self.parse_expression() {
            Some(inner) => children.push(inner),
            None => {
                self.reset(mark);
                if !self.depth_reported {
                    self.error_at_current("Expected expression after '('");
                }
            }
        }

        if !self.eat_after_whitespace(')') && !self.depth_reported {
            self.error_at_current("Expected closing parenthesis");
        }
        let span = self.span_from(start);
        AstNode::branch(NodeKind::GroupExpr, children, span)
    }

    /// `named_capture := "(?P<" IDENT ">" expression ")"`
    fn parse_named_capture(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume_literal("(?P<");

        let mut children = Vec::new();
        let Some(name) = self.expect_identifier("Expected capture name after '(?P<'") else {
            return AstNode::branch(NodeKind::NamedCapture, children, self.span_from(start));
        };
        children.push(name);

        if !self.cursor_mut().consume('>') {
            self.error_at_current("Expected '>' after capture name");
            return AstNode::branch(NodeKind::NamedCapture, children, self.span_from(start));
        }

        let mark = self.mark();
        self.skip_whitespace();
        match self.parse_expression() {
            Some(inner) => children.push(inner),
            None => {
                self.reset(mark);
                if !self.depth_reported {
                    self.error_at_current("Expected expression inside named capture");
                }
            }
        }

        if !self.eat_after_whitespace(')') && !self.depth_reported {
            self.error_at_current("Expected closing parenthesis");
        }
        let span = self.span_from(start);
        AstNode::branch(NodeKind::NamedCapture, children, span)
    }

    /// `list_match := "[[" IDENT (":" filter_expr)? "]]"`
    fn parse_list_match(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume_literal("[[");
        self.cursor_mut().skip_inline_whitespace();

        let mut children = Vec::new();
        let Some(name) = self.expect_identifier("Expected list name after '[['") else {
            self.skip_to_list_end();
            return AstNode::branch(NodeKind::ListMatch, children, self.span_from(start));
        };
        children.push(name);
        self.cursor_mut().skip_inline_whitespace();

        if self.cursor_mut().consume(':') {
            self.cursor_mut().skip_inline_whitespace();
            if let Some(filter) = self.parse_filter_expr() {
                children.push(filter);
            }
            self.cursor_mut().skip_inline_whitespace();
        }

        if !self.cursor_mut().consume_literal("]]") {
            self.error_at_current("Expected ']]' to close list match");
            self.skip_to_list_end();
        }
        let span = self.span_from(start);
        AstNode::branch(NodeKind::ListMatch, children, span)
    }

    /// Skip past the `]]` of a malformed list match, staying on the line.
    fn skip_to_list_end(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            if self.cursor_mut().consume_literal("]]") {
                break;
            }
            self.cursor_mut().advance();
        }
    }

    /// `filter_expr := IDENT "(" STRING ")"`
    fn parse_filter_expr(&mut self) -> Option<AstNode> {
        let start = self.mark();
        let name = self.expect_identifier("Expected filter name after ':'")?;
        let mut children = vec![name];

        if !self.cursor_mut().consume('(') {
            self.error_at_current("Expected '(' after filter name");
            return Some(AstNode::branch(NodeKind::FilterExpr, children, self.span_from(start)));
        }
        self.cursor_mut().skip_inline_whitespace();
        if let Some(arg) = self.expect_string("Expected string argument for filter") {
            children.push(arg);
        }
        self.cursor_mut().skip_inline_whitespace();
        if !self.cursor_mut().consume(')') {
            self.error_at_current("Expected ')' to close filter");
        }
        let span = self.span_from(start);
        Some(AstNode::branch(NodeKind::FilterExpr, children, span))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Atoms
    // ══════════════════════════════════════════════════════════════════════════

    /// `regex_atom := escape | anchor | "." | charclass | STRING | IDENT`
    fn parse_regex_atom(&mut self) -> Option<AstNode> {
        let start = self.mark();
        match self.peek()? {
            '\\' => Some(self.parse_escape()),
            '^' | '$' => {
                let ch = self.cursor_mut().advance()?;
                Some(AstNode::text(NodeKind::Anchor, ch, self.span_from(start)))
            }
            '.' => {
                self.cursor_mut().advance();
                Some(AstNode::text(NodeKind::Dot, ".", self.span_from(start)))
            }
            '[' => Some(self.parse_charclass()),
            '"' => self.parse_string(),
            c if is_ident_start(c) => self.parse_identifier(),
            _ => None,
        }
    }

    /// `escape := "\" any-char`; the value keeps the backslash.
    fn parse_escape(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume('\\');
        match self.peek() {
            Some(ch) if ch != '\n' && ch != '\r' => {
                self.cursor_mut().advance();
            }
            _ => {
                let span = self.span_from(start);
                self.error_at("Incomplete escape sequence", span);
            }
        }
        let raw = self.cursor().slice_from(start);
        AstNode::text(NodeKind::Escape, raw, self.span_from(start))
    }

    /// `charclass := "[" (char_range | escape | char)* "]"`
    fn parse_charclass(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume('[');

        let mut items = Vec::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    self.error_at_current("Expected ']' to close character class");
                    break;
                }
                Some(']') => {
                    self.cursor_mut().advance();
                    break;
                }
                Some(_) => {
                    let item = self.parse_class_item();
                    items.push(item);
                }
            }
        }

        let raw = self.cursor().slice_from(start);
        let span = self.span_from(start);
        AstNode::branch(NodeKind::Charclass, items, span).with_text(raw)
    }

    /// One member of a character class: a range, an escape or a single char.
    fn parse_class_item(&mut self) -> AstNode {
        let start = self.mark();
        let low = self.parse_class_char();

        let is_range = self.peek() == Some('-')
            && !matches!(self.cursor().peek_at(1), None | Some(']') | Some('\n'));
        if !is_range {
            return low;
        }
        self.cursor_mut().advance();
        let high = self.parse_class_char();
        let raw = self.cursor().slice_from(start);
        let span = self.span_from(start);
        AstNode::branch(NodeKind::CharRange, vec![low, high], span).with_text(raw)
    }

    fn parse_class_char(&mut self) -> AstNode {
        if self.peek() == Some('\\') {
            return self.parse_escape();
        }
        let start = self.mark();
        let ch = self.cursor_mut().advance().unwrap_or_default();
        AstNode::text(NodeKind::Char, ch, self.span_from(start))
    }
}
