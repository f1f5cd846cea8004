//! Parser for Inox source code.
//!
//! Statements are newline-terminated. A statement that fails to parse is
//! recorded as a [`ParseError`], replaced by an [`NodeKind::Invalid`] node,
//! and parsing resumes at the next statement boundary, so a tree is always
//! produced. The only fatal outcome is [`ParseFailure::Timeout`].

mod expr;
mod stmt;

use std::time::{Duration, Instant};

use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

/// Result type for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse error with message and location.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// A parse that produced no tree at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    #[error("parsing of {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

/// Parser for Inox source code.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    /// End offset of the last consumed token.
    prev_end: u32,
    errors: Vec<ParseError>,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            prev_end: 0,
            errors: Vec::new(),
            deadline: None,
            timed_out: false,
        }
    }

    /// Gives up parsing once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Parse a whole chunk. Returns the tree and the recovered errors, or
    /// `None` when the deadline expired.
    pub fn parse_chunk(mut self) -> Option<(Node, Vec<ParseError>)> {
        let mut includable = false;
        let mut manifest = None;

        loop {
            self.skip_newlines();
            match self.current.kind {
                TokenKind::IncludableFile if !includable && manifest.is_none() => {
                    self.next_token();
                    includable = true;
                }
                TokenKind::Manifest if manifest.is_none() => match self.parse_manifest() {
                    Ok(node) => manifest = Some(Box::new(node)),
                    Err(err) => {
                        self.errors.push(err);
                        self.recover();
                    }
                },
                _ => break,
            }
        }

        let statements = self.parse_statements(&TokenKind::Eof);
        if self.timed_out {
            return None;
        }

        let chunk = Node::new(
            NodeKind::Chunk {
                manifest,
                includable,
                statements,
            },
            Span::new(0, self.current.span.end),
        );
        Some((chunk, self.errors))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Token Management
    // ═══════════════════════════════════════════════════════════════════════

    /// Advance to the next token.
    fn next_token(&mut self) {
        self.prev_end = self.current.span.end;
        self.current = std::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    /// Check if current token matches the given kind.
    fn cur_is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Check if peek token matches the given kind.
    fn peek_is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek.kind) == std::mem::discriminant(kind)
    }

    /// Check if at end of file.
    fn at_eof(&self) -> bool {
        self.cur_is(&TokenKind::Eof)
    }

    /// The current token starts right where the previous one ended.
    fn cur_is_adjacent(&self) -> bool {
        self.current.span.start == self.prev_end
    }

    /// Consume current token if it matches, return true if consumed.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.cur_is(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Expect current token to match, consume and return its span.
    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Span> {
        if self.cur_is(kind) {
            let span = self.current.span;
            self.next_token();
            Ok(span)
        } else {
            Err(self.error(&format!(
                "expected {}, found {}",
                kind.name(),
                self.current.kind.name()
            )))
        }
    }

    fn skip_newlines(&mut self) {
        while self.cur_is(&TokenKind::Newline) {
            self.next_token();
        }
    }

    /// Skips newlines and commas between collection elements.
    fn skip_separators(&mut self) {
        while self.cur_is(&TokenKind::Newline) || self.cur_is(&TokenKind::Comma) {
            self.next_token();
        }
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.prev_end.max(start.end))
    }

    fn node(&self, kind: NodeKind, start: Span) -> Node {
        Node::new(kind, self.span_from(start))
    }

    fn check_deadline(&mut self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.timed_out = true;
            }
        }
        self.timed_out
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Error Helpers
    // ═══════════════════════════════════════════════════════════════════════

    /// Create an error at the current position.
    fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.current.span)
    }

    /// Create an error at a specific span.
    fn error_at(&self, message: &str, span: Span) -> ParseError {
        ParseError::new(message, span)
    }

    /// Skips to the next statement boundary at the current nesting depth.
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current.kind {
                TokenKind::Eof => return,
                TokenKind::Newline | TokenKind::Semi if depth == 0 => return,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket if depth == 0 => return,
                TokenKind::LBrace
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::RecordOpen
                | TokenKind::DictOpen
                | TokenKind::KeyListOpen
                | TokenKind::ObjectPatternOpen => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => depth -= 1,
                _ => {}
            }
            self.next_token();
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Common Parsers
    // ═══════════════════════════════════════════════════════════════════════

    /// Parse an identifier in a binding position.
    fn parse_name(&mut self) -> ParseResult<Name> {
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let name = Name::new(name.clone(), self.current.span);
                self.next_token();
                Ok(name)
            }
            _ => Err(self.error(&format!(
                "expected identifier, found {}",
                self.current.kind.name()
            ))),
        }
    }

    fn parse_manifest(&mut self) -> ParseResult<Node> {
        let start = self.expect(&TokenKind::Manifest)?;
        let object = self.parse_expr()?;
        Ok(self.node(
            NodeKind::Manifest {
                object: Box::new(object),
            },
            start,
        ))
    }
}

/// Parse source code without a deadline.
pub fn parse(source: &str) -> (Node, Vec<ParseError>) {
    match Parser::new(source).parse_chunk() {
        Some(parsed) => parsed,
        None => (
            Node::new(
                NodeKind::Chunk {
                    manifest: None,
                    includable: false,
                    statements: Vec::new(),
                },
                Span::dummy(),
            ),
            Vec::new(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Node {
        let (chunk, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        chunk
    }

    #[test]
    fn test_manifest_and_statements() {
        let chunk = parse_ok("manifest {}\nvar x = 1\n$x = 2");
        assert!(chunk.manifest().is_some());
        assert_eq!(chunk.statements().len(), 2);
    }

    #[test]
    fn test_includable_marker() {
        let chunk = parse_ok("includable-file\n\nfn f(){}");
        match &chunk.kind {
            NodeKind::Chunk {
                includable,
                manifest,
                ..
            } => {
                assert!(*includable);
                assert!(manifest.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_recovery_keeps_following_statements() {
        let (chunk, errors) = parse("manifest {}\nvar = \nvar y = 2");
        assert_eq!(errors.len(), 1);
        let statements = chunk.statements();
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0].kind, NodeKind::Invalid));
        assert!(matches!(statements[1].kind, NodeKind::LocalVarDecls { .. }));
    }

    #[test]
    fn test_expired_deadline_gives_no_tree() {
        let parser = Parser::new("manifest {}\nvar x = 1").with_deadline(Instant::now());
        assert!(parser.parse_chunk().is_none());
    }
}
