//! Expression, literal and pattern parsing for Inox.

use super::{ParseResult, Parser};
use crate::ast::{BinaryOp, Name, Node, NodeKind, PropKey, UnaryOp};
use crate::token::{Span, TokenKind};

/// Splits `1h30mn` into `([1, 30], ["h", "mn"])`.
pub fn split_quantity(text: &str) -> Option<(Vec<f64>, Vec<String>)> {
    let mut values = Vec::new();
    let mut units = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        values.push(rest[..number_len].parse::<f64>().ok()?);
        rest = &rest[number_len..];

        let unit_len = if rest.starts_with('%') {
            1
        } else {
            rest.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(rest.len())
        };
        if unit_len == 0 {
            return None;
        }
        units.push(rest[..unit_len].to_string());
        rest = &rest[unit_len..];
    }

    (!values.is_empty()).then_some((values, units))
}

impl<'a> Parser<'a> {
    // ═══════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════

    /// Parses a primary expression followed by adjacent calls, member
    /// accesses, indexing and ranges.
    pub(super) fn parse_expr(&mut self) -> ParseResult<Node> {
        let start = self.current.span;
        let mut expr = self.parse_primary()?;

        loop {
            if !self.cur_is_adjacent() {
                break;
            }
            match &self.current.kind {
                TokenKind::LParen => {
                    self.next_token();
                    let args = self.parse_list_until(&TokenKind::RParen, Self::parse_expr)?;
                    expr = self.node(
                        NodeKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        start,
                    );
                }
                TokenKind::Dot => {
                    self.next_token();
                    let property = self.parse_property_name()?;
                    expr = self.node(
                        NodeKind::Member {
                            left: Box::new(expr),
                            property,
                        },
                        start,
                    );
                }
                TokenKind::LBracket => {
                    self.next_token();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = self.node(
                        NodeKind::Index {
                            indexed: Box::new(expr),
                            index: Box::new(index),
                        },
                        start,
                    );
                }
                TokenKind::DotDot if matches!(expr.kind, NodeKind::Int(_) | NodeKind::Float(_)) => {
                    self.next_token();
                    let is_float = matches!(expr.kind, NodeKind::Float(_));
                    let upper = if self.cur_is_adjacent() && self.starts_number() {
                        Some(Box::new(self.parse_primary()?))
                    } else {
                        None
                    };
                    let lower = Box::new(expr);
                    let kind = if is_float {
                        NodeKind::FloatRange { lower, upper }
                    } else {
                        NodeKind::IntRange { lower, upper }
                    };
                    expr = self.node(kind, start);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn starts_number(&self) -> bool {
        match self.current.kind {
            TokenKind::Int(_) | TokenKind::Float(_) => true,
            TokenKind::Minus => {
                matches!(self.peek.kind, TokenKind::Int(_) | TokenKind::Float(_))
                    && self.peek.span.start == self.current.span.end
            }
            _ => false,
        }
    }

    pub(super) fn parse_primary(&mut self) -> ParseResult<Node> {
        let start = self.current.span;
        let kind = match &self.current.kind {
            // Literals
            TokenKind::Int(v) => NodeKind::Int(*v),
            TokenKind::Float(v) => NodeKind::Float(*v),
            TokenKind::Quantity(text) => self.quantity_kind(text, false)?,
            TokenKind::Rate(text) => self.rate_kind(text, false)?,
            TokenKind::Str(s) => NodeKind::Str(s.clone()),
            TokenKind::True => NodeKind::Bool(true),
            TokenKind::False => NodeKind::Bool(false),
            TokenKind::Nil => NodeKind::Nil,
            TokenKind::AbsPath(p) => NodeKind::AbsPath(p.clone()),
            TokenKind::RelPath(p) => NodeKind::RelPath(p.clone()),
            TokenKind::Url(u) => NodeKind::Url(u.clone()),
            TokenKind::Host(h) => NodeKind::Host(h.clone()),

            // Names
            TokenKind::Variable(name) => NodeKind::Variable(name.clone()),
            TokenKind::GlobalVariable(name) => NodeKind::GlobalVariable(name.clone()),
            TokenKind::Ident(name) => NodeKind::Ident(name.clone()),
            TokenKind::SelfKw => NodeKind::SelfExpr,
            TokenKind::PatternIdent(name) => NodeKind::PatternIdent {
                name: name.clone(),
                unprefixed: false,
            },
            TokenKind::PatternNs(name) => NodeKind::PatternNsIdent(name.clone()),
            TokenKind::PatternNsMember(ns, member) => {
                let ns_len = ns.len() as u32 + 1;
                let namespace = Name::new(ns.clone(), Span::new(start.start, start.start + ns_len));
                let member = Name::new(member.clone(), Span::new(start.start + ns_len + 1, start.end));
                NodeKind::PatternNsMember { namespace, member }
            }

            // Prefixed forms
            TokenKind::Minus => return self.parse_minus(),
            TokenKind::Not => {
                self.next_token();
                let operand = self.parse_expr()?;
                return Ok(self.node(
                    NodeKind::Unary {
                        op: UnaryOp::Not,
                        operand: Box::new(operand),
                    },
                    start,
                ));
            }
            TokenKind::Tilde => {
                self.next_token();
                let expr = self.parse_expr()?;
                return Ok(self.node(NodeKind::RuntimeTypeCheck { expr: Box::new(expr) }, start));
            }
            TokenKind::Comp => {
                self.next_token();
                let expr = self.parse_expr()?;
                return Ok(self.node(NodeKind::Compute { expr: Box::new(expr) }, start));
            }
            TokenKind::Star | TokenKind::Readonly => return self.parse_type(),
            TokenKind::SendVal => return self.parse_sendval(),
            TokenKind::New => return self.parse_new(),

            // Compound forms
            TokenKind::LParen => return self.parse_paren(),
            TokenKind::LBracket => return self.parse_list(),
            TokenKind::LBrace => return self.parse_object(false),
            TokenKind::RecordOpen => return self.parse_object(true),
            TokenKind::DictOpen => return self.parse_dictionary(),
            TokenKind::KeyListOpen => return self.parse_key_list(),
            TokenKind::ObjectPatternOpen => return self.parse_object_pattern(),
            TokenKind::MappingKw => return self.parse_mapping(),
            TokenKind::Fn => {
                self.next_token();
                return self.parse_fn_rest(start);
            }
            TokenKind::Go => return self.parse_spawn(),
            TokenKind::TestSuite => return self.parse_test(true, false),
            TokenKind::TestCase => return self.parse_test(false, false),

            other => {
                return Err(self.error(&format!("unexpected {} in expression", other.name())));
            }
        };
        self.next_token();
        Ok(self.node(kind, start))
    }

    fn quantity_kind(&self, text: &str, negative: bool) -> ParseResult<NodeKind> {
        let (mut values, units) =
            split_quantity(text).ok_or_else(|| self.error(&format!("invalid quantity literal {}", text)))?;
        if negative {
            values.iter_mut().for_each(|v| *v = -*v);
        }
        Ok(NodeKind::Quantity { values, units })
    }

    fn rate_kind(&self, text: &str, negative: bool) -> ParseResult<NodeKind> {
        let (quantity, div_unit) = text
            .rsplit_once('/')
            .ok_or_else(|| self.error(&format!("invalid rate literal {}", text)))?;
        match self.quantity_kind(quantity, negative)? {
            NodeKind::Quantity { values, units } => Ok(NodeKind::Rate {
                values,
                units,
                div_unit: div_unit.to_string(),
            }),
            _ => Err(self.error(&format!("invalid rate literal {}", text))),
        }
    }

    /// `-` directly followed by a number is a negative literal.
    fn parse_minus(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Minus)?;
        if self.cur_is_adjacent() {
            let kind = match &self.current.kind {
                TokenKind::Int(v) => Some(NodeKind::Int(-*v)),
                TokenKind::Float(v) => Some(NodeKind::Float(-*v)),
                TokenKind::Quantity(text) => Some(self.quantity_kind(text, true)?),
                TokenKind::Rate(text) => Some(self.rate_kind(text, true)?),
                _ => None,
            };
            if let Some(kind) = kind {
                self.next_token();
                return Ok(self.node(kind, start));
            }
        }
        let operand = self.parse_expr()?;
        Ok(self.node(
            NodeKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            },
            start,
        ))
    }

    /// `(expr)`, `(a op b)`, `(for ...)` or `(walk ...)`.
    fn parse_paren(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::LParen)?;
        self.skip_newlines();

        let inner = match self.current.kind {
            TokenKind::For => self.parse_for(true)?,
            TokenKind::Walk => self.parse_walk(true)?,
            _ => {
                let left = self.parse_expr()?;
                self.skip_newlines();
                match self.binary_op() {
                    Some(op) => {
                        self.next_token();
                        self.skip_newlines();
                        let right = self.parse_expr()?;
                        self.node(
                            NodeKind::Binary {
                                op,
                                left: Box::new(left),
                                right: Box::new(right),
                            },
                            start,
                        )
                    }
                    None => left,
                }
            }
        };

        self.skip_newlines();
        self.expect(&TokenKind::RParen)?;
        match inner.kind {
            NodeKind::Binary { .. } => Ok(Node {
                span: self.span_from(start),
                ..inner
            }),
            _ => Ok(inner),
        }
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        match self.current.kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::LtEq => Some(BinaryOp::LtEq),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::GtEq => Some(BinaryOp::GtEq),
            TokenKind::And => Some(BinaryOp::And),
            TokenKind::Or => Some(BinaryOp::Or),
            TokenKind::DotDot => Some(BinaryOp::Range),
            _ => None,
        }
    }

    /// Parses `item (, item)*` until `end`, newlines allowed between items.
    /// The opening delimiter must already be consumed.
    fn parse_list_until(
        &mut self,
        end: &TokenKind,
        mut item: impl FnMut(&mut Self) -> ParseResult<Node>,
    ) -> ParseResult<Vec<Node>> {
        let mut items = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(end) {
                return Ok(items);
            }
            items.push(item(self)?);
            let newline_separated = self.cur_is(&TokenKind::Newline);
            self.skip_newlines();
            if !newline_separated && !self.cur_is(&TokenKind::Comma) && !self.cur_is(end) {
                return Err(self.error(&format!(
                    "expected , or {}, found {}",
                    end.name(),
                    self.current.kind.name()
                )));
            }
        }
    }

    /// A property name after `.`: identifiers and keywords.
    fn parse_property_name(&mut self) -> ParseResult<Name> {
        if !self.cur_is_adjacent() {
            return Err(self.error("unexpected whitespace after '.'"));
        }
        let text = match &self.current.kind {
            TokenKind::Ident(name) => name.clone(),
            other => match other.keyword_text() {
                Some(text) => text.to_string(),
                None => return Err(self.error("expected property name after '.'")),
            },
        };
        let name = Name::new(text, self.current.span);
        self.next_token();
        Ok(name)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Collections
    // ═══════════════════════════════════════════════════════════════════════

    fn parse_list(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::LBracket)?;
        let elements = self.parse_list_until(&TokenKind::RBracket, Self::parse_expr)?;
        Ok(self.node(NodeKind::List { elements }, start))
    }

    /// Returns the key if the current token is a key followed by `:`.
    fn try_parse_prop_key(&mut self) -> Option<PropKey> {
        if !self.peek_is(&TokenKind::Colon) {
            return None;
        }
        let (name, quoted) = match &self.current.kind {
            TokenKind::Ident(name) => (name.clone(), false),
            TokenKind::Str(s) => (s.clone(), true),
            other => (other.keyword_text()?.to_string(), false),
        };
        let key = PropKey {
            name,
            span: self.current.span,
            quoted,
        };
        self.next_token();
        self.next_token();
        Some(key)
    }

    /// `{ key: value, element, ...$spread, on received %p handler, _meta_ { ... } }`,
    /// or a record literal `#{ ... }`.
    fn parse_object(&mut self, record: bool) -> ParseResult<Node> {
        let start = self.current.span;
        self.next_token();

        let mut properties = Vec::new();
        let mut meta_properties = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            let prop_start = self.current.span;

            if !record && self.cur_is(&TokenKind::On) && !self.peek_is(&TokenKind::Colon) {
                self.next_token();
                self.expect(&TokenKind::Received)?;
                let pattern = self.parse_type()?;
                let handler = self.parse_expr()?;
                properties.push(self.node(
                    NodeKind::ReceptionHandler {
                        pattern: Box::new(pattern),
                        handler: Box::new(handler),
                    },
                    prop_start,
                ));
            } else if !record && self.at_metaproperty() {
                let key = self.parse_name()?;
                let init = self.parse_initialization_block()?;
                meta_properties.push(self.node(
                    NodeKind::MetaProperty {
                        key,
                        init: Box::new(init),
                    },
                    prop_start,
                ));
            } else if self.eat(&TokenKind::Ellipsis) {
                let expr = self.parse_expr()?;
                properties.push(self.node(NodeKind::PropertySpread { expr: Box::new(expr) }, prop_start));
            } else {
                let key = self.try_parse_prop_key();
                let value = self.parse_expr()?;
                properties.push(self.node(
                    NodeKind::ObjectProperty {
                        key,
                        value: Box::new(value),
                    },
                    prop_start,
                ));
            }

            let newline_separated = self.cur_is(&TokenKind::Newline);
            self.skip_newlines();
            if !newline_separated && !self.cur_is(&TokenKind::Comma) && !self.cur_is(&TokenKind::RBrace) {
                return Err(self.error(&format!(
                    "expected , or }}, found {}",
                    self.current.kind.name()
                )));
            }
        }

        let kind = if record {
            NodeKind::Record { properties }
        } else {
            NodeKind::Object {
                properties,
                meta_properties,
            }
        };
        Ok(self.node(kind, start))
    }

    /// An identifier like `_name_` followed by a block.
    fn at_metaproperty(&self) -> bool {
        match &self.current.kind {
            TokenKind::Ident(name) => {
                name.len() > 2 && name.starts_with('_') && name.ends_with('_') && self.peek_is(&TokenKind::LBrace)
            }
            _ => false,
        }
    }

    fn parse_initialization_block(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::LBrace)?;
        let statements = self.parse_statements(&TokenKind::RBrace);
        self.expect(&TokenKind::RBrace)?;
        Ok(self.node(NodeKind::InitializationBlock { statements }, start))
    }

    /// `:{ key: value }`
    fn parse_dictionary(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::DictOpen)?;
        let entries = self.parse_list_until(&TokenKind::RBrace, |p| {
            let entry_start = p.current.span;
            let key = p.parse_primary()?;
            p.expect(&TokenKind::Colon)?;
            let value = p.parse_expr()?;
            Ok(p.node(
                NodeKind::DictEntry {
                    key: Box::new(key),
                    value: Box::new(value),
                },
                entry_start,
            ))
        })?;
        Ok(self.node(NodeKind::Dictionary { entries }, start))
    }

    /// `.{a, b}`
    fn parse_key_list(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::KeyListOpen)?;
        let mut keys = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            keys.push(self.parse_name()?);
        }
        Ok(self.node(NodeKind::KeyList { keys }, start))
    }

    /// `Mapping { key => value \n %pattern k [g] => value }`
    fn parse_mapping(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::MappingKw)?;
        self.expect(&TokenKind::LBrace)?;

        let mut entries = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            let entry_start = self.current.span;
            let key = Box::new(self.parse_expr()?);

            let kind = if matches!(self.current.kind, TokenKind::Ident(_)) {
                let key_var = self.parse_name()?;
                let group_var = if matches!(self.current.kind, TokenKind::Ident(_)) {
                    Some(self.parse_name()?)
                } else {
                    None
                };
                self.expect(&TokenKind::FatArrow)?;
                let value = Box::new(self.parse_expr()?);
                NodeKind::DynamicMappingEntry {
                    key,
                    key_var,
                    group_var,
                    value,
                }
            } else {
                self.expect(&TokenKind::FatArrow)?;
                let value = Box::new(self.parse_expr()?);
                NodeKind::StaticMappingEntry { key, value }
            };
            entries.push(self.node(kind, entry_start));
        }

        Ok(self.node(NodeKind::Mapping { entries }, start))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Patterns and Types
    // ═══════════════════════════════════════════════════════════════════════

    /// Parses a pattern in a type position: bare names are pattern
    /// identifiers and braces open object patterns.
    pub(super) fn parse_type(&mut self) -> ParseResult<Node> {
        let start = self.current.span;
        match &self.current.kind {
            TokenKind::Star => {
                self.next_token();
                let value = self.parse_type()?;
                Ok(self.node(NodeKind::PointerType { value: Box::new(value) }, start))
            }
            TokenKind::Readonly => {
                self.next_token();
                let pattern = self.parse_type()?;
                Ok(self.node(NodeKind::Readonly { pattern: Box::new(pattern) }, start))
            }
            TokenKind::Ident(name) => {
                let kind = NodeKind::PatternIdent {
                    name: name.clone(),
                    unprefixed: true,
                };
                self.next_token();
                Ok(self.node(kind, start))
            }
            TokenKind::LBrace | TokenKind::ObjectPatternOpen => self.parse_object_pattern(),
            _ => self.parse_expr(),
        }
    }

    /// `%{ key: pattern }`, or `{ key: pattern }` in a type position.
    fn parse_object_pattern(&mut self) -> ParseResult<Node> {
        let start = self.current.span;
        self.next_token();

        let mut properties = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            let prop_start = self.current.span;
            let Some(key) = self.try_parse_prop_key() else {
                return Err(self.error("object pattern properties must have a key"));
            };
            let value = self.parse_type()?;
            properties.push(self.node(
                NodeKind::ObjectPatternProperty {
                    key,
                    value: Box::new(value),
                },
                prop_start,
            ));
        }

        Ok(self.node(NodeKind::ObjectPattern { properties }, start))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════════

    /// Parses `[captures](params) [return type] { body }` after `fn` or `fn name`.
    pub(super) fn parse_fn_rest(&mut self, start: Span) -> ParseResult<Node> {
        let mut captures = Vec::new();
        if self.eat(&TokenKind::LBracket) {
            loop {
                self.skip_separators();
                if self.eat(&TokenKind::RBracket) {
                    break;
                }
                captures.push(self.parse_name()?);
            }
        }

        self.expect(&TokenKind::LParen)?;
        let params = self.parse_list_until(&TokenKind::RParen, |p| {
            let param_start = p.current.span;
            let name = p.parse_name()?;
            let ty = if p.cur_is(&TokenKind::Comma)
                || p.cur_is(&TokenKind::RParen)
                || p.cur_is(&TokenKind::Newline)
            {
                None
            } else {
                Some(Box::new(p.parse_type()?))
            };
            Ok(p.node(NodeKind::Param { name, ty }, param_start))
        })?;

        let return_type = if self.cur_is(&TokenKind::LBrace) {
            None
        } else {
            Some(Box::new(self.parse_type()?))
        };
        let body = self.parse_block()?;

        Ok(self.node(
            NodeKind::FnExpr {
                captures,
                params,
                return_type,
                body: Box::new(body),
            },
            start,
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Structs, Concurrency
    // ═══════════════════════════════════════════════════════════════════════

    /// `new Type [{ field: value }]`
    fn parse_new(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::New)?;
        let ty = match &self.current.kind {
            TokenKind::Ident(name) => {
                let kind = NodeKind::PatternIdent {
                    name: name.clone(),
                    unprefixed: true,
                };
                let ty_start = self.current.span;
                self.next_token();
                self.node(kind, ty_start)
            }
            _ => self.parse_type()?,
        };

        let init = if self.cur_is(&TokenKind::LBrace) {
            let init_start = self.current.span;
            self.next_token();
            let mut fields = Vec::new();
            loop {
                self.skip_separators();
                if self.eat(&TokenKind::RBrace) {
                    break;
                }
                let field_start = self.current.span;
                let name = self.parse_name()?;
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expr()?;
                fields.push(self.node(
                    NodeKind::StructFieldInit {
                        name,
                        value: Box::new(value),
                    },
                    field_start,
                ));
            }
            Some(Box::new(self.node(NodeKind::StructInit { fields }, init_start)))
        } else {
            None
        };

        Ok(self.node(
            NodeKind::New {
                ty: Box::new(ty),
                init,
            },
            start,
        ))
    }

    /// `go [meta] do { module }` or `go [meta] do f()`.
    fn parse_spawn(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Go)?;
        let meta = if self.cur_is(&TokenKind::Do) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        self.expect(&TokenKind::Do)?;

        let module = if self.cur_is(&TokenKind::LBrace) {
            self.parse_embedded_module_body()?
        } else {
            let module_start = self.current.span;
            let expr = self.parse_expr()?;
            if !matches!(expr.kind, NodeKind::Call { .. }) {
                return Err(self.error_at(
                    "a call or an embedded module is expected after 'do'",
                    expr.span,
                ));
            }
            self.node(
                NodeKind::EmbeddedModule {
                    manifest: None,
                    statements: vec![expr],
                    single_call_expr: true,
                },
                module_start,
            )
        };

        Ok(self.node(
            NodeKind::Spawn {
                meta,
                module: Box::new(module),
            },
            start,
        ))
    }

    /// `sendval <value> to <receiver>`
    fn parse_sendval(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::SendVal)?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::To)?;
        let receiver = self.parse_expr()?;
        Ok(self.node(
            NodeKind::SendValue {
                value: Box::new(value),
                receiver: Box::new(receiver),
            },
            start,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn expr(source: &str) -> Node {
        let (chunk, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        match chunk.kind {
            NodeKind::Chunk { mut statements, .. } => statements.remove(0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_split_quantity() {
        assert_eq!(
            split_quantity("1h30mn"),
            Some((vec![1.0, 30.0], vec!["h".to_string(), "mn".to_string()]))
        );
        assert_eq!(split_quantity("5%"), Some((vec![5.0], vec!["%".to_string()])));
        assert_eq!(split_quantity("h"), None);
    }

    #[test]
    fn test_int_range() {
        match expr("1..0").kind {
            NodeKind::IntRange { lower, upper } => {
                assert!(matches!(lower.kind, NodeKind::Int(1)));
                assert!(matches!(upper.map(|u| u.kind), Some(NodeKind::Int(0))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_negative_quantity() {
        match expr("-1s").kind {
            NodeKind::Quantity { values, units } => {
                assert_eq!(values, vec![-1.0]);
                assert_eq!(units, vec!["s".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rate() {
        match expr("10kB/s").kind {
            NodeKind::Rate { units, div_unit, .. } => {
                assert_eq!(units, vec!["kB".to_string()]);
                assert_eq!(div_unit, "s");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_member_and_binary() {
        match expr("f($a.b, (1 + 2))").kind {
            NodeKind::Call { callee, args } => {
                assert!(matches!(callee.kind, NodeKind::Ident(ref n) if n == "f"));
                assert!(matches!(args[0].kind, NodeKind::Member { ref property, .. } if property.text == "b"));
                assert!(matches!(args[1].kind, NodeKind::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_object_with_implicit_keys_and_handler() {
        match expr("{a: 1, 2\n on received %int fn(m){}}").kind {
            NodeKind::Object { properties, .. } => {
                assert_eq!(properties.len(), 3);
                assert!(matches!(properties[0].kind, NodeKind::ObjectProperty { key: Some(_), .. }));
                assert!(matches!(properties[1].kind, NodeKind::ObjectProperty { key: None, .. }));
                assert!(matches!(properties[2].kind, NodeKind::ReceptionHandler { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_object_with_metaproperty() {
        match expr("{a: 1, _visibility_ {\n  {public: .{a}}\n}}").kind {
            NodeKind::Object {
                properties,
                meta_properties,
            } => {
                assert_eq!(properties.len(), 1);
                assert_eq!(meta_properties.len(), 1);
                match &meta_properties[0].kind {
                    NodeKind::MetaProperty { key, init } => {
                        assert_eq!(key.text, "_visibility_");
                        assert!(matches!(&init.kind, NodeKind::InitializationBlock { statements } if statements.len() == 1));
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fn_expr_with_captures() {
        match expr("fn[a](x %int, y) int { return x }").kind {
            NodeKind::FnExpr {
                captures,
                params,
                return_type,
                ..
            } => {
                assert_eq!(captures[0].text, "a");
                assert_eq!(params.len(), 2);
                assert!(return_type.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mapping_entries() {
        match expr("Mapping {\n 0 => 1\n %int n g => n\n}").kind {
            NodeKind::Mapping { entries } => {
                assert!(matches!(entries[0].kind, NodeKind::StaticMappingEntry { .. }));
                assert!(matches!(
                    entries[1].kind,
                    NodeKind::DynamicMappingEntry { ref key_var, group_var: Some(_), .. } if key_var.text == "n"
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_spawn_forms() {
        match expr("go {globals: .{a}} do {\n  f()\n}").kind {
            NodeKind::Spawn { meta, module } => {
                assert!(meta.is_some());
                assert!(matches!(module.kind, NodeKind::EmbeddedModule { single_call_expr: false, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
        match expr("go do f()").kind {
            NodeKind::Spawn { module, .. } => {
                assert!(matches!(module.kind, NodeKind::EmbeddedModule { single_call_expr: true, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_for_expression() {
        let node = expr("(for e in $list: e)");
        assert!(matches!(node.kind, NodeKind::ForExpr { .. }));
    }

    #[test]
    fn test_new_struct() {
        match expr("new Point {x: 1}").kind {
            NodeKind::New { ty, init } => {
                assert!(matches!(ty.kind, NodeKind::PatternIdent { ref name, unprefixed: true } if name == "Point"));
                assert!(init.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
