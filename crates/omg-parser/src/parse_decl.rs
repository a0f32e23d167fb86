//! Top-level and declaration parsing.
//!
//! Handles the document header (`version`, `import`, `resolver default`),
//! rule definitions and the `uses` clauses that configure resolvers.

use omg_scanner::{is_word_char, Mark};
use omg_types::{AstNode, NodeKind};

use crate::parser::Parser;

/// Flags accepted after `import ... with`.
pub const IMPORT_FLAGS: &[&str] = &[
    "word-boundary",
    "word-prefix",
    "word-suffix",
    "ignore-case",
    "ignore-punctuation",
    "elide-whitespace",
    "line-start",
    "line-end",
];

/// Plain flags accepted after `uses ... with`.
pub const RESOLVER_FLAGS: &[&str] = &["ignore-case", "ignore-punctuation"];

/// Keyword introducing the file-list resolver flag.
pub const OPTIONAL_TOKENS: &str = "optional-tokens";

/// Words that may scope a resolver method.
pub const RESOLVER_SCOPES: &[&str] = &["default", "local"];

/// How a single rule definition attempt ended.
enum RuleOutcome {
    /// No identifier at the cursor: nothing more to parse.
    NoRule,
    /// A rule was produced; `clean` is false if errors were reported inside it.
    Rule { node: AstNode, clean: bool },
}

impl Parser {
    // ══════════════════════════════════════════════════════════════════════════
    // Root
    // ══════════════════════════════════════════════════════════════════════════

    /// `root := version_stmt? import_stmt* resolver_default? rule_def*`
    pub(crate) fn parse_root(&mut self) -> AstNode {
        let start = self.mark();
        let mut children = Vec::new();

        self.skip_whitespace();
        if self.at_keyword("version") {
            children.push(self.parse_version_stmt());
            self.skip_whitespace();
        }

        while self.at_keyword("import") {
            if self.too_many_errors() {
                break;
            }
            let before = self.error_count();
            children.push(self.parse_import_stmt());
            if self.error_count() > before {
                self.skip_line();
            }
            self.skip_whitespace();
        }

        if self.at_resolver_default() {
            let before = self.error_count();
            children.push(self.parse_resolver_default());
            if self.error_count() > before {
                self.synchronize();
            }
            self.skip_whitespace();
        }

        while !self.cursor().at_end() && !self.too_many_errors() {
            match self.parse_rule_def() {
                RuleOutcome::NoRule => break,
                RuleOutcome::Rule { node, clean } => {
                    children.push(node);
                    if !clean {
                        self.synchronize();
                    }
                }
            }
            self.skip_whitespace();
        }

        let span = self.span_from(start);
        AstNode::branch(NodeKind::Root, children, span)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Header Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// `version_stmt := "version" FLOAT`
    fn parse_version_stmt(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume_word("version");
        let mark = self.mark();
        self.skip_whitespace();

        let mut children = Vec::new();
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let lit_start = self.mark();
            let mut text = self.cursor_mut().take_while(|c| c.is_ascii_digit());
            while self.peek() == Some('.')
                && self.cursor().peek_at(1).is_some_and(|c| c.is_ascii_digit())
            {
                self.cursor_mut().advance();
                text.push('.');
                text.push_str(&self.cursor_mut().take_while(|c| c.is_ascii_digit()));
            }
            let span = self.span_from(lit_start);
            children.push(AstNode::text(NodeKind::VersionLiteral, text, span));
        } else {
            self.reset(mark);
            self.error_at_current("Expected version number after 'version'");
        }

        let span = self.span_from(start);
        AstNode::branch(NodeKind::VersionStmt, children, span)
    }

    /// `import_stmt := "import" STRING "as" IDENT ("with" import_opts)?`
    fn parse_import_stmt(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume_word("import");

        let mut children = Vec::new();
        let mark = self.mark();
        self.skip_whitespace();
        let Some(path) = self.parse_string() else {
            self.reset(mark);
            self.error_at_current("Expected file path string after 'import'");
            return AstNode::branch(NodeKind::ImportStmt, children, self.span_from(start));
        };
        children.push(path);

        if !self.eat_word_after_whitespace("as") {
            self.error_at_current("Expected 'as' after import path");
            return AstNode::branch(NodeKind::ImportStmt, children, self.span_from(start));
        }
        let mark = self.mark();
        self.skip_whitespace();
        let alias = if self.at_rule_start() {
            None
        } else {
            self.parse_identifier()
        };
        let Some(alias) = alias else {
            self.reset(mark);
            self.error_at_current("Expected alias name after 'as'");
            return AstNode::branch(NodeKind::ImportStmt, children, self.span_from(start));
        };
        children.push(alias);

        if self.eat_word_after_whitespace("with") {
            children.push(self.parse_import_opts());
        }

        let span = self.span_from(start);
        AstNode::branch(NodeKind::ImportStmt, children, span)
    }

    /// `import_opts := import_flag ("," import_flag)*`
    ///
    /// Called with the cursor just past `with`.
    fn parse_import_opts(&mut self) -> AstNode {
        self.cursor_mut().skip_inline_whitespace();
        let start = self.mark();
        let mut flags = Vec::new();
        loop {
            if !self.skip_to_list_item("Expected import flag after 'with'") {
                break;
            }
            let flag_start = self.mark();
            match self.cursor().peek_word() {
                Some(word) if IMPORT_FLAGS.contains(&word.as_str()) => {
                    self.cursor_mut().consume_word(&word);
                    flags.push(AstNode::text(
                        NodeKind::ImportFlag,
                        word,
                        self.span_from(flag_start),
                    ));
                }
                Some(word) => {
                    self.cursor_mut().take_while(is_word_char);
                    let span = self.span_from(flag_start);
                    self.error_at(format!("Unknown import flag '{word}'"), span);
                }
                None => {
                    self.error_at_current("Expected import flag after 'with'");
                    break;
                }
            }
            if !self.eat_after_whitespace(',') {
                break;
            }
        }
        let span = self.span_from(start);
        AstNode::branch(NodeKind::ImportOpts, flags, span)
    }

    /// True at `resolver default` (but not at a rule named `resolver`).
    fn at_resolver_default(&mut self) -> bool {
        if !self.at_keyword("resolver") {
            return false;
        }
        let mark = self.mark();
        self.cursor_mut().consume_word("resolver");
        self.skip_whitespace();
        let result = self.cursor().check_word("default");
        self.reset(mark);
        result
    }

    /// `resolver_default := "resolver" "default" "uses" uses_clause`
    fn parse_resolver_default(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume_word("resolver");
        self.skip_whitespace();
        self.cursor_mut().consume_word("default");

        let mut children = Vec::new();
        let mark = self.mark();
        self.skip_whitespace();
        let uses_start = self.mark();
        if self.cursor_mut().consume_word("uses") {
            children.push(self.parse_uses_clause(uses_start));
        } else {
            self.reset(mark);
            self.error_at_current("Expected 'uses' after 'resolver default'");
        }

        let span = self.span_from(start);
        AstNode::branch(NodeKind::ResolverDefault, children, span)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Rule Definitions
    // ══════════════════════════════════════════════════════════════════════════

    /// `rule_def := IDENT "=" expression ("uses" uses_clause)?`
    fn parse_rule_def(&mut self) -> RuleOutcome {
        let start = self.mark();
        let before = self.error_count();
        let Some(name) = self.parse_identifier() else {
            return RuleOutcome::NoRule;
        };
        let rule_name = name.text_value().unwrap_or_default().to_string();
        let mut children = vec![name];

        let mark = self.mark();
        self.skip_whitespace();
        let has_eq = self.peek() == Some('=') && self.cursor().peek_at(1) != Some('=');
        if has_eq {
            self.cursor_mut().advance();
        } else {
            self.reset(mark);
            self.error_at_current(format!("Expected '=' after rule name '{rule_name}'"));
            let node = AstNode::branch(NodeKind::RuleDef, children, self.span_from(start));
            return RuleOutcome::Rule { node, clean: false };
        }

        let mark = self.mark();
        self.skip_whitespace();
        match self.parse_expression() {
            Some(expr) => children.push(expr),
            None => {
                self.reset(mark);
                self.error_at_current(format!("Expected expression after '=' in rule '{rule_name}'"));
                let node = AstNode::branch(NodeKind::RuleDef, children, self.span_from(start));
                return RuleOutcome::Rule { node, clean: false };
            }
        }

        let mark = self.mark();
        self.skip_whitespace();
        if self.at_keyword("uses") {
            let uses_start = self.mark();
            self.cursor_mut().consume_word("uses");
            children.push(self.parse_uses_clause(uses_start));
        } else {
            self.reset(mark);
        }

        let node = AstNode::branch(NodeKind::RuleDef, children, self.span_from(start));
        RuleOutcome::Rule {
            node,
            clean: self.error_count() == before,
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Resolver Configuration
    // ══════════════════════════════════════════════════════════════════════════

    /// `uses_clause := resolver_scope? resolver_method ("with" resolver_with)?`
    ///
    /// Called with the cursor just past the `uses` keyword;
    /// `start` marks the `uses` keyword itself. A scope word on its own
    /// (`uses default with ...`) selects the scoped resolver without naming
    /// a method.
    fn parse_uses_clause(&mut self, start: Mark) -> AstNode {
        let mut children = Vec::new();
        let after_keyword = self.mark();
        self.skip_whitespace();

        let scope = self.parse_resolver_scope();
        let scoped = scope.is_some();
        if let Some(scope) = scope {
            children.push(scope);
        }

        let mark = self.mark();
        if scoped {
            self.skip_whitespace();
        }
        let method = if self.cursor().check_word("with") || self.at_rule_start() {
            None
        } else {
            self.parse_resolver_method()
        };
        match method {
            Some(method) => children.push(method),
            None if scoped => self.reset(mark),
            None => {
                self.reset(after_keyword);
                self.error_at_current("Expected resolver method name after 'uses'");
                return AstNode::branch(NodeKind::UsesClause, children, self.span_from(start));
            }
        }

        if self.eat_word_after_whitespace("with") {
            children.push(self.parse_resolver_with());
        }

        let span = self.span_from(start);
        AstNode::branch(NodeKind::UsesClause, children, span)
    }

    /// `resolver_scope := "default" | "local"`
    fn parse_resolver_scope(&mut self) -> Option<AstNode> {
        let word = self.cursor().peek_word()?;
        if !RESOLVER_SCOPES.contains(&word.as_str()) {
            return None;
        }
        let start = self.mark();
        self.cursor_mut().consume_word(&word);
        Some(AstNode::text(NodeKind::ResolverScope, word, self.span_from(start)))
    }

    /// `resolver_method := IDENT ("(" resolver_arg ("," resolver_arg)* ")")?`
    fn parse_resolver_method(&mut self) -> Option<AstNode> {
        let start = self.mark();
        let name = self.parse_identifier()?;
        let mut children = vec![name];
        if self.peek() == Some('(') {
            children.push(self.parse_resolver_arg_list());
        }
        let span = self.span_from(start);
        Some(AstNode::branch(NodeKind::ResolverMethod, children, span))
    }

    fn parse_resolver_arg_list(&mut self) -> AstNode {
        let start = self.mark();
        self.cursor_mut().consume('(');
        let mut args = Vec::new();
        loop {
            self.skip_whitespace();
            match self.parse_resolver_arg() {
                Some(arg) => args.push(arg),
                None => {
                    self.error_at_current("Expected resolver argument");
                    break;
                }
            }
            if !self.eat_after_whitespace(',') {
                break;
            }
        }
        if !self.eat_after_whitespace(')') {
            self.error_at_current("Expected ')' to close resolver arguments");
        }
        let span = self.span_from(start);
        AstNode::branch(NodeKind::ResolverArgList, args, span)
    }

    /// `resolver_arg := (IDENT "=")? STRING`
    fn parse_resolver_arg(&mut self) -> Option<AstNode> {
        let start = self.mark();
        let mut children = Vec::new();
        if let Some(name) = self.parse_identifier() {
            children.push(name);
            if !self.eat_after_whitespace('=') {
                self.error_at_current("Expected '=' after resolver argument name");
                return Some(AstNode::branch(NodeKind::ResolverArg, children, self.span_from(start)));
            }
            self.skip_whitespace();
            let value = self.expect_string("Expected string value for resolver argument")?;
            children.push(value);
        } else {
            children.push(self.parse_string()?);
        }
        let span = self.span_from(start);
        Some(AstNode::branch(NodeKind::ResolverArg, children, span))
    }

    /// `resolver_with := resolver_flag ("," resolver_flag)*`
    ///
    /// Called with the cursor just past `with`.
    fn parse_resolver_with(&mut self) -> AstNode {
        self.cursor_mut().skip_inline_whitespace();
        let start = self.mark();
        let mut flags = Vec::new();
        loop {
            if !self.skip_to_list_item("Expected resolver flag after 'with'") {
                break;
            }
            if let Some(flag) = self.parse_resolver_flag() {
                flags.push(flag);
            }
            if !self.eat_after_whitespace(',') {
                break;
            }
        }
        let span = self.span_from(start);
        AstNode::branch(NodeKind::ResolverWith, flags, span)
    }

    /// `resolver_flag := "ignore-case" | "ignore-punctuation"
    ///                 | "optional-tokens" "(" STRING ("," STRING)* ")"`
    ///
    /// The node value is the flag's source text.
    fn parse_resolver_flag(&mut self) -> Option<AstNode> {
        let start = self.mark();
        let Some(word) = self.cursor().peek_word() else {
            self.error_at_current("Expected resolver flag after 'with'");
            return None;
        };

        if RESOLVER_FLAGS.contains(&word.as_str()) {
            self.cursor_mut().consume_word(&word);
            return Some(AstNode::text(NodeKind::ResolverFlag, word, self.span_from(start)));
        }

        if word == OPTIONAL_TOKENS {
            self.cursor_mut().consume_word(OPTIONAL_TOKENS);
            let clause = self.parse_optional_tokens_clause();
            let text = self.cursor().slice_from(start);
            let span = self.span_from(start);
            return Some(AstNode::branch(NodeKind::ResolverFlag, vec![clause], span).with_text(text));
        }

        self.cursor_mut().take_while(is_word_char);
        let span = self.span_from(start);
        self.error_at(format!("Unknown resolver flag '{word}'"), span);
        None
    }

    /// `"(" STRING ("," STRING)* ")"` after `optional-tokens`.
    fn parse_optional_tokens_clause(&mut self) -> AstNode {
        let start = self.mark();
        let mut files = Vec::new();
        if !self.eat_after_whitespace('(') {
            self.error_at_current("Expected '(' after 'optional-tokens'");
            return AstNode::branch(NodeKind::OptionalTokensClause, files, self.span_from(start));
        }
        loop {
            self.skip_whitespace();
            match self.expect_string("Expected file name string in 'optional-tokens'") {
                Some(file) => files.push(file),
                None => break,
            }
            if !self.eat_after_whitespace(',') {
                break;
            }
        }
        if !self.eat_after_whitespace(')') {
            self.error_at_current("Expected ')' to close 'optional-tokens'");
        }
        let span = self.span_from(start);
        AstNode::branch(NodeKind::OptionalTokensClause, files, span)
    }
}
