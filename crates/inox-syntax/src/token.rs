//! Token definitions for the Inox lexer.

use std::fmt;

pub use inox_common::Span;

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token kinds for Inox.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    // ═══════════════════════════════════════════════════════════════════════
    // Literals
    // ═══════════════════════════════════════════════════════════════════════
    Ident(String),
    /// `$name`, without the sigil.
    Variable(String),
    /// `$$name`, without the sigils.
    GlobalVariable(String),
    Int(i64),
    Float(f64),
    /// Raw quantity text such as `1h30mn` or `10kB`.
    Quantity(String),
    /// Raw rate text such as `10kB/s`.
    Rate(String),
    Str(String),
    AbsPath(String),
    RelPath(String),
    Url(String),
    Host(String),
    /// `%name`, without the sigil.
    PatternIdent(String),
    /// `%ns.`, namespace name only.
    PatternNs(String),
    /// `%ns.member`
    PatternNsMember(String, String),

    // ═══════════════════════════════════════════════════════════════════════
    // Keywords
    // ═══════════════════════════════════════════════════════════════════════

    // Module keywords
    Manifest,
    IncludableFile,
    Import,

    // Declaration keywords
    Const,
    Var,
    GlobalVar,
    AssignKw,
    Fn,
    Pattern,
    PNamespace,
    Struct,
    New,
    Extend,

    // Control flow keywords
    If,
    Else,
    For,
    In,
    Walk,
    Switch,
    Match,
    DefaultCase,
    Return,
    Break,
    Continue,
    Yield,
    Prune,
    Coyield,

    // Concurrency and testing keywords
    Go,
    Do,
    TestSuite,
    TestCase,
    SendVal,
    To,
    On,
    Received,

    // Expression keywords
    SelfKw,
    Comp,
    MappingKw,
    Readonly,
    And,
    Or,

    // Literal keywords
    True,
    False,
    Nil,

    // ═══════════════════════════════════════════════════════════════════════
    // Operators
    // ═══════════════════════════════════════════════════════════════════════

    // Arithmetic
    Plus,  // +
    Minus, // -
    Star,  // *
    Slash, // /

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=

    // Misc
    Not,       // !
    Tilde,     // ~
    At,        // @
    FatArrow,  // =>
    Dot,       // .
    DotDot,    // ..
    Ellipsis,  // ...

    // ═══════════════════════════════════════════════════════════════════════
    // Assignment
    // ═══════════════════════════════════════════════════════════════════════
    Assign,      // =
    PlusAssign,  // +=
    MinusAssign, // -=
    StarAssign,  // *=
    SlashAssign, // /=

    // ═══════════════════════════════════════════════════════════════════════
    // Delimiters
    // ═══════════════════════════════════════════════════════════════════════
    LParen,            // (
    RParen,            // )
    LBracket,          // [
    RBracket,          // ]
    LBrace,            // {
    RBrace,            // }
    RecordOpen,        // #{
    DictOpen,          // :{
    KeyListOpen,       // .{
    ObjectPatternOpen, // %{
    Comma,             // ,
    Colon,             // :
    Semi,              // ;
    Newline,

    // ═══════════════════════════════════════════════════════════════════════
    // Special
    // ═══════════════════════════════════════════════════════════════════════
    Eof,
    Invalid(char),
}

impl TokenKind {
    /// Get a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Ident(_) => "identifier",
            TokenKind::Variable(_) => "variable",
            TokenKind::GlobalVariable(_) => "global variable",
            TokenKind::Int(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::Quantity(_) => "quantity",
            TokenKind::Rate(_) => "rate",
            TokenKind::Str(_) => "string",
            TokenKind::AbsPath(_) => "absolute path",
            TokenKind::RelPath(_) => "relative path",
            TokenKind::Url(_) => "url",
            TokenKind::Host(_) => "host",
            TokenKind::PatternIdent(_) => "pattern identifier",
            TokenKind::PatternNs(_) => "pattern namespace",
            TokenKind::PatternNsMember(_, _) => "pattern namespace member",
            TokenKind::Manifest => "manifest",
            TokenKind::IncludableFile => "includable-file",
            TokenKind::Import => "import",
            TokenKind::Const => "const",
            TokenKind::Var => "var",
            TokenKind::GlobalVar => "globalvar",
            TokenKind::AssignKw => "assign",
            TokenKind::Fn => "fn",
            TokenKind::Pattern => "pattern",
            TokenKind::PNamespace => "pnamespace",
            TokenKind::Struct => "struct",
            TokenKind::New => "new",
            TokenKind::Extend => "extend",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::Walk => "walk",
            TokenKind::Switch => "switch",
            TokenKind::Match => "match",
            TokenKind::DefaultCase => "defaultcase",
            TokenKind::Return => "return",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Yield => "yield",
            TokenKind::Prune => "prune",
            TokenKind::Coyield => "coyield",
            TokenKind::Go => "go",
            TokenKind::Do => "do",
            TokenKind::TestSuite => "testsuite",
            TokenKind::TestCase => "testcase",
            TokenKind::SendVal => "sendval",
            TokenKind::To => "to",
            TokenKind::On => "on",
            TokenKind::Received => "received",
            TokenKind::SelfKw => "self",
            TokenKind::Comp => "comp",
            TokenKind::MappingKw => "Mapping",
            TokenKind::Readonly => "readonly",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Nil => "nil",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Not => "!",
            TokenKind::Tilde => "~",
            TokenKind::At => "@",
            TokenKind::FatArrow => "=>",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::Ellipsis => "...",
            TokenKind::Assign => "=",
            TokenKind::PlusAssign => "+=",
            TokenKind::MinusAssign => "-=",
            TokenKind::StarAssign => "*=",
            TokenKind::SlashAssign => "/=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::RecordOpen => "#{",
            TokenKind::DictOpen => ":{",
            TokenKind::KeyListOpen => ".{",
            TokenKind::ObjectPatternOpen => "%{",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semi => ";",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",
            TokenKind::Invalid(_) => "invalid character",
        }
    }

    /// Returns the text of keyword tokens, which may also be used as property names.
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            TokenKind::Ident(_)
            | TokenKind::Variable(_)
            | TokenKind::GlobalVariable(_)
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Quantity(_)
            | TokenKind::Rate(_)
            | TokenKind::Str(_)
            | TokenKind::AbsPath(_)
            | TokenKind::RelPath(_)
            | TokenKind::Url(_)
            | TokenKind::Host(_)
            | TokenKind::PatternIdent(_)
            | TokenKind::PatternNs(_)
            | TokenKind::PatternNsMember(_, _)
            | TokenKind::Invalid(_)
            | TokenKind::Eof
            | TokenKind::Newline => None,
            other => {
                let name = other.name();
                name.starts_with(|c: char| c.is_ascii_alphabetic())
                    .then_some(name)
            }
        }
    }

    /// Returns true for tokens that end a statement.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Semi | TokenKind::Eof | TokenKind::RBrace
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_text() {
        assert_eq!(TokenKind::Manifest.keyword_text(), Some("manifest"));
        assert_eq!(TokenKind::IncludableFile.keyword_text(), Some("includable-file"));
        assert_eq!(TokenKind::Comma.keyword_text(), None);
        assert_eq!(TokenKind::Ident("a".into()).keyword_text(), None);
    }

    #[test]
    fn test_terminators() {
        assert!(TokenKind::Newline.is_terminator());
        assert!(TokenKind::RBrace.is_terminator());
        assert!(!TokenKind::Comma.is_terminator());
    }
}
