//! Statement parsing for Inox.

use super::{ParseResult, Parser};
use crate::ast::{AssignOp, Name, Node, NodeKind};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    // ═══════════════════════════════════════════════════════════════════════
    // Statement Lists
    // ═══════════════════════════════════════════════════════════════════════

    /// Parses statements until `end` (not consumed) or end of file.
    pub(super) fn parse_statements(&mut self, end: &TokenKind) -> Vec<Node> {
        let mut statements = Vec::new();
        loop {
            while self.cur_is(&TokenKind::Newline) || self.cur_is(&TokenKind::Semi) {
                self.next_token();
            }
            if self.cur_is(end) || self.at_eof() || self.check_deadline() {
                break;
            }

            let start = self.current.span;
            let result = self
                .parse_stmt()
                .and_then(|stmt| self.expect_terminator().map(|_| stmt));
            match result {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.recover();
                    // A stray closing delimiter: skip it to make progress.
                    if self.current.span.start == start.start && !self.at_eof() {
                        self.next_token();
                    }
                    statements.push(self.node(NodeKind::Invalid, start));
                }
            }
        }
        statements
    }

    fn expect_terminator(&mut self) -> ParseResult<()> {
        if self.current.kind.is_terminator() {
            Ok(())
        } else {
            Err(self.error(&format!(
                "unterminated statement, unexpected {}",
                self.current.kind.name()
            )))
        }
    }

    /// Parses `{ statements }`.
    pub(super) fn parse_block(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::LBrace)?;
        let statements = self.parse_statements(&TokenKind::RBrace);
        self.expect(&TokenKind::RBrace)?;
        Ok(self.node(NodeKind::Block { statements }, start))
    }

    /// Parses the braced body of an embedded module, manifest included.
    pub(super) fn parse_embedded_module_body(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::LBrace)?;
        self.skip_newlines();
        let manifest = if self.cur_is(&TokenKind::Manifest) {
            Some(Box::new(self.parse_manifest()?))
        } else {
            None
        };
        let statements = self.parse_statements(&TokenKind::RBrace);
        self.expect(&TokenKind::RBrace)?;
        Ok(self.node(
            NodeKind::EmbeddedModule {
                manifest,
                statements,
                single_call_expr: false,
            },
            start,
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Statement Dispatch
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn parse_stmt(&mut self) -> ParseResult<Node> {
        match &self.current.kind {
            TokenKind::Import => self.parse_import(),
            TokenKind::Const => self.parse_const_decls(),
            TokenKind::Var => self.parse_var_decls(false),
            TokenKind::GlobalVar => self.parse_var_decls(true),
            TokenKind::AssignKw => self.parse_multi_assignment(),
            TokenKind::Fn if matches!(self.peek.kind, TokenKind::Ident(_)) => self.parse_fn_decl(),
            TokenKind::Struct => self.parse_struct_def(),
            TokenKind::Pattern => self.parse_pattern_def(),
            TokenKind::PNamespace => self.parse_pattern_ns_def(),
            TokenKind::Extend => self.parse_extend(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for(false),
            TokenKind::Walk => self.parse_walk(false),
            TokenKind::Switch => self.parse_switch_or_match(false),
            TokenKind::Match => self.parse_switch_or_match(true),
            TokenKind::TestSuite => self.parse_test(true, true),
            TokenKind::TestCase => self.parse_test(false, true),
            TokenKind::Break => self.parse_keyword_stmt(NodeKind::Break),
            TokenKind::Continue => self.parse_keyword_stmt(NodeKind::Continue),
            TokenKind::Prune => self.parse_keyword_stmt(NodeKind::Prune),
            TokenKind::Return => self.parse_value_stmt(NodeKind::Return),
            TokenKind::Yield => self.parse_value_stmt(NodeKind::Yield),
            TokenKind::Coyield => self.parse_value_stmt(NodeKind::Coyield),
            TokenKind::Manifest => Err(self.error("the manifest should be at the start of the module")),
            TokenKind::IncludableFile => {
                Err(self.error("includable-file should be at the start of the file"))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_keyword_stmt(&mut self, kind: NodeKind) -> ParseResult<Node> {
        let start = self.current.span;
        self.next_token();
        Ok(self.node(kind, start))
    }

    fn parse_value_stmt(&mut self, make: fn(Option<Box<Node>>) -> NodeKind) -> ParseResult<Node> {
        let start = self.current.span;
        self.next_token();
        let value = if self.current.kind.is_terminator() {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        Ok(self.node(make(value), start))
    }

    /// An expression, optionally followed by an assignment operator.
    fn parse_expr_stmt(&mut self) -> ParseResult<Node> {
        let start = self.current.span;
        let left = self.parse_expr()?;

        let Some(op) = self.try_assign_op() else {
            return Ok(left);
        };
        if !matches!(
            left.kind,
            NodeKind::Variable(_)
                | NodeKind::GlobalVariable(_)
                | NodeKind::Ident(_)
                | NodeKind::Member { .. }
                | NodeKind::Index { .. }
        ) {
            return Err(self.error_at("invalid assignment target", left.span));
        }
        self.next_token();
        let right = self.parse_expr()?;
        Ok(self.node(
            NodeKind::Assignment {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            start,
        ))
    }

    fn try_assign_op(&self) -> Option<AssignOp> {
        match self.current.kind {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::Add),
            TokenKind::MinusAssign => Some(AssignOp::Sub),
            TokenKind::StarAssign => Some(AssignOp::Mul),
            TokenKind::SlashAssign => Some(AssignOp::Div),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Module Statements
    // ═══════════════════════════════════════════════════════════════════════

    /// `import ./file.ix` or `import name <source> {config}`.
    fn parse_import(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Import)?;

        if matches!(self.current.kind, TokenKind::Ident(_)) {
            let identifier = self.parse_name()?;
            let source = self.parse_primary()?;
            if self.current.kind.is_terminator() {
                return Err(self.error("missing configuration of module import"));
            }
            let config = self.parse_expr()?;
            return Ok(self.node(
                NodeKind::Import {
                    identifier,
                    source: Box::new(source),
                    config: Box::new(config),
                },
                start,
            ));
        }

        let source = self.parse_primary()?;
        Ok(self.node(
            NodeKind::InclusionImport {
                source: Box::new(source),
            },
            start,
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Declarations
    // ═══════════════════════════════════════════════════════════════════════

    /// `const a = 1` or `const ( a = 1 \n b = 2 )`.
    fn parse_const_decls(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Const)?;
        let mut decls = Vec::new();

        let grouped = self.eat(&TokenKind::LParen);
        loop {
            if grouped {
                self.skip_newlines();
                if self.eat(&TokenKind::RParen) {
                    break;
                }
            }
            let decl_start = self.current.span;
            let name = self.parse_name()?;
            self.expect(&TokenKind::Assign)?;
            let value = self.parse_expr()?;
            decls.push(self.node(
                NodeKind::GlobalConstDecl {
                    name,
                    value: Box::new(value),
                },
                decl_start,
            ));
            if !grouped {
                break;
            }
        }

        Ok(self.node(NodeKind::GlobalConstDecls { decls }, start))
    }

    /// `var x [type] = value`, `globalvar ...`, or their grouped forms.
    fn parse_var_decls(&mut self, global: bool) -> ParseResult<Node> {
        let start = self.current.span;
        self.next_token();
        let mut decls = Vec::new();

        let grouped = self.eat(&TokenKind::LParen);
        loop {
            if grouped {
                self.skip_newlines();
                if self.eat(&TokenKind::RParen) {
                    break;
                }
            }
            let decl_start = self.current.span;
            let name = self.parse_name()?;
            let ty = if self.cur_is(&TokenKind::Assign) || self.current.kind.is_terminator() {
                None
            } else {
                Some(Box::new(self.parse_type()?))
            };
            let value = if self.eat(&TokenKind::Assign) {
                Some(Box::new(self.parse_expr()?))
            } else {
                None
            };
            let kind = if global {
                NodeKind::GlobalVarDecl { name, ty, value }
            } else {
                NodeKind::LocalVarDecl { name, ty, value }
            };
            decls.push(self.node(kind, decl_start));
            if !grouped {
                break;
            }
        }

        let kind = if global {
            NodeKind::GlobalVarDecls { decls }
        } else {
            NodeKind::LocalVarDecls { decls }
        };
        Ok(self.node(kind, start))
    }

    /// `assign a b = <expr>`
    fn parse_multi_assignment(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::AssignKw)?;
        let mut vars: Vec<Name> = Vec::new();
        while !self.cur_is(&TokenKind::Assign) {
            vars.push(self.parse_name()?);
        }
        if vars.is_empty() {
            return Err(self.error("multi assignment requires at least one variable"));
        }
        self.expect(&TokenKind::Assign)?;
        let right = self.parse_expr()?;
        Ok(self.node(
            NodeKind::MultiAssignment {
                vars,
                right: Box::new(right),
            },
            start,
        ))
    }

    /// `fn name(params) [return type] { body }`
    pub(super) fn parse_fn_decl(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Fn)?;
        let name = self.parse_name()?;
        let function = self.parse_fn_rest(start)?;
        Ok(self.node(
            NodeKind::FnDecl {
                name,
                function: Box::new(function),
            },
            start,
        ))
    }

    /// `struct Name { field type \n fn method() {} }`
    fn parse_struct_def(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Struct)?;
        let name = self.parse_name()?;
        self.expect(&TokenKind::LBrace)?;

        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            if self.cur_is(&TokenKind::Fn) {
                body.push(self.parse_fn_decl()?);
                continue;
            }
            let field_start = self.current.span;
            let field_name = self.parse_name()?;
            let ty = self.parse_type()?;
            body.push(self.node(
                NodeKind::StructField {
                    name: field_name,
                    ty: Box::new(ty),
                },
                field_start,
            ));
        }

        Ok(self.node(NodeKind::StructDef { name, body }, start))
    }

    /// `pattern name = [@]<pattern>`
    fn parse_pattern_def(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Pattern)?;
        let name = self.parse_name()?;
        self.expect(&TokenKind::Assign)?;
        let lazy = self.eat(&TokenKind::At);
        let value = self.parse_type()?;
        Ok(self.node(
            NodeKind::PatternDef {
                name,
                value: Box::new(value),
                lazy,
            },
            start,
        ))
    }

    /// `pnamespace name. = <object>`
    fn parse_pattern_ns_def(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::PNamespace)?;
        let name = self.parse_name()?;
        if !self.cur_is_adjacent() || !self.eat(&TokenKind::Dot) {
            return Err(self.error("pattern namespace names should end with a dot"));
        }
        self.expect(&TokenKind::Assign)?;
        let value = self.parse_expr()?;
        Ok(self.node(
            NodeKind::PatternNsDef {
                name,
                value: Box::new(value),
            },
            start,
        ))
    }

    /// `extend <pattern> <object>`
    fn parse_extend(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Extend)?;
        let pattern = self.parse_type()?;
        if !self.cur_is(&TokenKind::LBrace) {
            return Err(self.error("an extension object is expected after the extended pattern"));
        }
        let extension = self.parse_primary()?;
        Ok(self.node(
            NodeKind::Extend {
                pattern: Box::new(pattern),
                extension: Box::new(extension),
            },
            start,
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Control Flow
    // ═══════════════════════════════════════════════════════════════════════

    fn parse_if_stmt(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::If)?;
        let test = self.parse_expr()?;
        let consequent = self.parse_block()?;

        let alternate = if self.eat(&TokenKind::Else) {
            if self.cur_is(&TokenKind::If) {
                Some(Box::new(self.parse_if_stmt()?))
            } else {
                Some(Box::new(self.parse_block()?))
            }
        } else {
            None
        };

        Ok(self.node(
            NodeKind::If {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            },
            start,
        ))
    }

    /// `for [key,] value in <iterated> { }`; in expression form the body can
    /// also be `: <expr>`.
    pub(super) fn parse_for(&mut self, is_expr: bool) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::For)?;
        let first = self.parse_name()?;
        let (key, value) = if self.eat(&TokenKind::Comma) {
            (Some(first), Some(self.parse_name()?))
        } else {
            (None, Some(first))
        };
        self.expect(&TokenKind::In)?;
        let iterated = self.parse_expr()?;
        let body = self.parse_loop_body(is_expr)?;

        let (iterated, body) = (Box::new(iterated), Box::new(body));
        let kind = if is_expr {
            NodeKind::ForExpr {
                key,
                value,
                iterated,
                body,
            }
        } else {
            NodeKind::For {
                key,
                value,
                iterated,
                body,
            }
        };
        Ok(self.node(kind, start))
    }

    /// `walk <walked> [meta,] entry { }`
    pub(super) fn parse_walk(&mut self, is_expr: bool) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Walk)?;
        let walked = self.parse_expr()?;
        let first = self.parse_name()?;
        let (meta, entry) = if self.eat(&TokenKind::Comma) {
            (Some(first), Some(self.parse_name()?))
        } else {
            (None, Some(first))
        };
        let body = self.parse_loop_body(is_expr)?;

        let (walked, body) = (Box::new(walked), Box::new(body));
        let kind = if is_expr {
            NodeKind::WalkExpr {
                walked,
                meta,
                entry,
                body,
            }
        } else {
            NodeKind::Walk {
                walked,
                meta,
                entry,
                body,
            }
        };
        Ok(self.node(kind, start))
    }

    fn parse_loop_body(&mut self, is_expr: bool) -> ParseResult<Node> {
        if is_expr && self.eat(&TokenKind::Colon) {
            return self.parse_expr();
        }
        self.parse_block()
    }

    /// `switch <expr> { values { } defaultcase { } }` and its `match` counterpart.
    fn parse_switch_or_match(&mut self, is_match: bool) -> ParseResult<Node> {
        let start = self.current.span;
        self.next_token();
        let discriminant = self.parse_expr()?;
        self.expect(&TokenKind::LBrace)?;

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            self.skip_newlines();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            let case_start = self.current.span;
            if self.eat(&TokenKind::DefaultCase) {
                if default.is_some() {
                    return Err(self.error_at("duplicate default case", case_start));
                }
                let block = self.parse_block()?;
                default = Some(Box::new(self.node(
                    NodeKind::DefaultCase {
                        block: Box::new(block),
                    },
                    case_start,
                )));
                continue;
            }

            let mut values = vec![self.parse_case_value(is_match)?];
            while self.eat(&TokenKind::Comma) {
                values.push(self.parse_case_value(is_match)?);
            }
            let group_var = if is_match && matches!(self.current.kind, TokenKind::Ident(_)) {
                Some(self.parse_name()?)
            } else {
                None
            };
            let block = Box::new(self.parse_block()?);
            let kind = if is_match {
                NodeKind::MatchCase {
                    values,
                    group_var,
                    block,
                }
            } else {
                NodeKind::SwitchCase { values, block }
            };
            cases.push(self.node(kind, case_start));
        }

        let discriminant = Box::new(discriminant);
        let kind = if is_match {
            NodeKind::Match {
                discriminant,
                cases,
                default,
            }
        } else {
            NodeKind::Switch {
                discriminant,
                cases,
                default,
            }
        };
        Ok(self.node(kind, start))
    }

    fn parse_case_value(&mut self, is_match: bool) -> ParseResult<Node> {
        if is_match && self.cur_is(&TokenKind::ObjectPatternOpen) {
            return self.parse_type();
        }
        self.parse_expr()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tests
    // ═══════════════════════════════════════════════════════════════════════

    /// `testsuite [meta] { }` or `testcase [meta] { }`.
    pub(super) fn parse_test(&mut self, suite: bool, is_statement: bool) -> ParseResult<Node> {
        let start = self.current.span;
        self.next_token();
        let meta = if self.cur_is(&TokenKind::LBrace) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let module = Box::new(self.parse_embedded_module_body()?);
        let kind = if suite {
            NodeKind::TestSuite {
                meta,
                module,
                is_statement,
            }
        } else {
            NodeKind::TestCase {
                meta,
                module,
                is_statement,
            }
        };
        Ok(self.node(kind, start))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Node, NodeKind};
    use crate::parser::parse;

    fn first_statement(source: &str) -> Node {
        let (chunk, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        match chunk.kind {
            NodeKind::Chunk { mut statements, .. } => statements.remove(0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_module_import() {
        let stmt = first_statement("import res ./lib.ix {}");
        match stmt.kind {
            NodeKind::Import {
                identifier,
                source,
                config,
            } => {
                assert_eq!(identifier.text, "res");
                assert!(matches!(source.kind, NodeKind::RelPath(ref p) if p == "./lib.ix"));
                assert!(matches!(config.kind, NodeKind::Object { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_inclusion_import() {
        let stmt = first_statement("import ./dep.ix");
        assert!(matches!(stmt.kind, NodeKind::InclusionImport { .. }));
    }

    #[test]
    fn test_grouped_const_decls() {
        let stmt = first_statement("const (\n  A = 1\n  B = \"b\"\n)");
        match stmt.kind {
            NodeKind::GlobalConstDecls { decls } => assert_eq!(decls.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_typed_local_var() {
        let stmt = first_statement("var x %int = 1");
        match stmt.kind {
            NodeKind::LocalVarDecls { decls } => match &decls[0].kind {
                NodeKind::LocalVarDecl { name, ty, value } => {
                    assert_eq!(name.text, "x");
                    assert!(ty.is_some());
                    assert!(value.is_some());
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_struct_def() {
        let stmt = first_statement("struct Point {\n  x int\n  fn norm() int { return 0 }\n}");
        match stmt.kind {
            NodeKind::StructDef { name, body } => {
                assert_eq!(name.text, "Point");
                assert!(matches!(body[0].kind, NodeKind::StructField { .. }));
                assert!(matches!(body[1].kind, NodeKind::FnDecl { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_match_with_group_var() {
        let stmt = first_statement("match $x {\n  %int n { }\n  defaultcase { }\n}");
        match stmt.kind {
            NodeKind::Match { cases, default, .. } => {
                assert!(default.is_some());
                match &cases[0].kind {
                    NodeKind::MatchCase { group_var, .. } => {
                        assert_eq!(group_var.as_ref().map(|n| n.text.as_str()), Some("n"))
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pattern_namespace_def() {
        let stmt = first_statement("pnamespace ns. = {a: %int}");
        assert!(matches!(stmt.kind, NodeKind::PatternNsDef { ref name, .. } if name.text == "ns"));
    }

    #[test]
    fn test_testsuite_statement() {
        let stmt = first_statement("testsuite \"suite\" {\n  testcase { }\n}");
        match stmt.kind {
            NodeKind::TestSuite {
                meta,
                module,
                is_statement,
            } => {
                assert!(is_statement);
                assert!(meta.is_some());
                assert_eq!(module.statements().len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assignment_ops() {
        let stmt = first_statement("$x += 1");
        assert!(matches!(stmt.kind, NodeKind::Assignment { .. }));
    }
}
