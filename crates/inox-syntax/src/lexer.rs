//! Lexer for Inox source code.
//!
//! Raw tokens are recognised by a `logos` state machine; numbers, identifiers
//! and URLs are extended by hand in callbacks where the grammar depends on
//! what follows (`1..0`, `1h30mn`, `10kB/s`, `includable-file`,
//! `https://example.com/x`). Newlines are significant and are kept as tokens.

use logos::Logos;

use crate::token::{Span, Token, TokenKind};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#([ \t][^\n]*)?")]
enum Raw {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", word)]
    Word,

    #[regex(r"[0-9]+", number)]
    Number,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_-]*")]
    Variable,

    #[regex(r"\$\$[a-zA-Z_][a-zA-Z0-9_-]*")]
    GlobalVariable,

    #[regex(r"%[a-zA-Z_][a-zA-Z0-9_-]*")]
    PatternIdent,

    #[regex(r"%[a-zA-Z_][a-zA-Z0-9_-]*\.")]
    PatternNs,

    #[regex(r"%[a-zA-Z_][a-zA-Z0-9_-]*\.[a-zA-Z_][a-zA-Z0-9_-]*")]
    PatternNsMember,

    #[regex(r"/[a-zA-Z0-9_.~/-]+")]
    AbsPath,

    #[regex(r"\.\.?/[a-zA-Z0-9_.~/-]*")]
    RelPath,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("!")]
    Not,
    #[token("~")]
    Tilde,
    #[token("@")]
    At,
    #[token("=>")]
    FatArrow,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("...")]
    Ellipsis,
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("#{")]
    RecordOpen,
    #[token(":{")]
    DictOpen,
    #[token(".{")]
    KeyListOpen,
    #[token("%{")]
    ObjectPatternOpen,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("\n")]
    Newline,
}

/// Extends an identifier with `-segment` parts, and into a URL or host when
/// `http`/`https` is directly followed by `://`.
fn word(lex: &mut logos::Lexer<Raw>) -> bool {
    let slice = lex.slice();
    if slice == "http" || slice == "https" {
        let rest = lex.remainder();
        if rest.starts_with("://") {
            let len = rest
                .char_indices()
                .find(|&(_, c)| c.is_whitespace() || matches!(c, ')' | '}' | ']' | ',' | '"'))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            lex.bump(len);
            return true;
        }
    }

    loop {
        let rest = lex.remainder().as_bytes();
        if rest.first() != Some(&b'-') {
            break;
        }
        let segment = rest[1..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();
        if segment == 0 {
            break;
        }
        lex.bump(1 + segment);
    }
    true
}

/// Extends a digit run into a float, quantity or rate.
fn number(lex: &mut logos::Lexer<Raw>) -> bool {
    fn digits(bytes: &[u8]) -> usize {
        bytes.iter().take_while(|b| b.is_ascii_digit()).count()
    }
    fn fraction(bytes: &[u8]) -> usize {
        if bytes.first() == Some(&b'.') && bytes.get(1).is_some_and(|b| b.is_ascii_digit()) {
            1 + digits(&bytes[1..])
        } else {
            0
        }
    }
    fn unit(bytes: &[u8]) -> usize {
        if bytes.first() == Some(&b'%') {
            return 1;
        }
        bytes.iter().take_while(|b| b.is_ascii_alphabetic()).count()
    }

    let rest = lex.remainder().as_bytes();
    let mut len = fraction(rest);

    let first_unit = unit(&rest[len..]);
    if first_unit > 0 {
        len += first_unit;
        loop {
            let n = digits(&rest[len..]);
            if n == 0 {
                break;
            }
            let value_len = n + fraction(&rest[len + n..]);
            let u = unit(&rest[len + value_len..]);
            if u == 0 {
                break;
            }
            len += value_len + u;
        }
        if rest.get(len) == Some(&b'/') {
            let div = rest[len + 1..]
                .iter()
                .take_while(|b| b.is_ascii_alphabetic())
                .count();
            if div > 0 {
                len += 1 + div;
            }
        }
    }

    lex.bump(len);
    true
}

/// Lexer for Inox source code.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Raw>,
    input: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: Raw::lexer(input),
            input,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        let Some(raw) = self.inner.next() else {
            let end = self.input.len();
            return Token::new(TokenKind::Eof, Span::from_usize(end, end));
        };
        let range = self.inner.span();
        let text = self.inner.slice();
        let kind = match raw {
            Ok(raw) => Self::convert(raw, text),
            Err(()) => TokenKind::Invalid(text.chars().next().unwrap_or('\0')),
        };
        Token::new(kind, Span::from_usize(range.start, range.end))
    }

    /// Tokenize the entire input.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn convert(raw: Raw, text: &str) -> TokenKind {
        match raw {
            Raw::Word => Self::read_word(text),
            Raw::Number => Self::read_number(text),
            Raw::Str => TokenKind::Str(unescape(&text[1..text.len() - 1])),
            Raw::Variable => TokenKind::Variable(text[1..].to_string()),
            Raw::GlobalVariable => TokenKind::GlobalVariable(text[2..].to_string()),
            Raw::PatternIdent => TokenKind::PatternIdent(text[1..].to_string()),
            Raw::PatternNs => TokenKind::PatternNs(text[1..text.len() - 1].to_string()),
            Raw::PatternNsMember => {
                let (ns, member) = text[1..].split_once('.').unwrap_or((&text[1..], ""));
                TokenKind::PatternNsMember(ns.to_string(), member.to_string())
            }
            Raw::AbsPath => TokenKind::AbsPath(text.to_string()),
            Raw::RelPath => TokenKind::RelPath(text.to_string()),
            Raw::Plus => TokenKind::Plus,
            Raw::Minus => TokenKind::Minus,
            Raw::Star => TokenKind::Star,
            Raw::Slash => TokenKind::Slash,
            Raw::EqEq => TokenKind::EqEq,
            Raw::NotEq => TokenKind::NotEq,
            Raw::Lt => TokenKind::Lt,
            Raw::LtEq => TokenKind::LtEq,
            Raw::Gt => TokenKind::Gt,
            Raw::GtEq => TokenKind::GtEq,
            Raw::Not => TokenKind::Not,
            Raw::Tilde => TokenKind::Tilde,
            Raw::At => TokenKind::At,
            Raw::FatArrow => TokenKind::FatArrow,
            Raw::Dot => TokenKind::Dot,
            Raw::DotDot => TokenKind::DotDot,
            Raw::Ellipsis => TokenKind::Ellipsis,
            Raw::Assign => TokenKind::Assign,
            Raw::PlusAssign => TokenKind::PlusAssign,
            Raw::MinusAssign => TokenKind::MinusAssign,
            Raw::StarAssign => TokenKind::StarAssign,
            Raw::SlashAssign => TokenKind::SlashAssign,
            Raw::LParen => TokenKind::LParen,
            Raw::RParen => TokenKind::RParen,
            Raw::LBracket => TokenKind::LBracket,
            Raw::RBracket => TokenKind::RBracket,
            Raw::LBrace => TokenKind::LBrace,
            Raw::RBrace => TokenKind::RBrace,
            Raw::RecordOpen => TokenKind::RecordOpen,
            Raw::DictOpen => TokenKind::DictOpen,
            Raw::KeyListOpen => TokenKind::KeyListOpen,
            Raw::ObjectPatternOpen => TokenKind::ObjectPatternOpen,
            Raw::Comma => TokenKind::Comma,
            Raw::Colon => TokenKind::Colon,
            Raw::Semi => TokenKind::Semi,
            Raw::Newline => TokenKind::Newline,
        }
    }

    fn read_word(text: &str) -> TokenKind {
        if let Some(after_scheme) = text.split_once("://").map(|(_, rest)| rest) {
            return if after_scheme.contains('/') {
                TokenKind::Url(text.to_string())
            } else {
                TokenKind::Host(text.to_string())
            };
        }
        Self::lookup_ident(text)
    }

    /// Look up keyword or return identifier.
    fn lookup_ident(ident: &str) -> TokenKind {
        match ident {
            "manifest" => TokenKind::Manifest,
            "includable-file" => TokenKind::IncludableFile,
            "import" => TokenKind::Import,
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "globalvar" => TokenKind::GlobalVar,
            "assign" => TokenKind::AssignKw,
            "fn" => TokenKind::Fn,
            "pattern" => TokenKind::Pattern,
            "pnamespace" => TokenKind::PNamespace,
            "struct" => TokenKind::Struct,
            "new" => TokenKind::New,
            "extend" => TokenKind::Extend,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "walk" => TokenKind::Walk,
            "switch" => TokenKind::Switch,
            "match" => TokenKind::Match,
            "defaultcase" => TokenKind::DefaultCase,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "yield" => TokenKind::Yield,
            "prune" => TokenKind::Prune,
            "coyield" => TokenKind::Coyield,
            "go" => TokenKind::Go,
            "do" => TokenKind::Do,
            "testsuite" => TokenKind::TestSuite,
            "testcase" => TokenKind::TestCase,
            "sendval" => TokenKind::SendVal,
            "to" => TokenKind::To,
            "on" => TokenKind::On,
            "received" => TokenKind::Received,
            "self" => TokenKind::SelfKw,
            "comp" => TokenKind::Comp,
            "Mapping" => TokenKind::MappingKw,
            "readonly" => TokenKind::Readonly,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nil" => TokenKind::Nil,
            _ => TokenKind::Ident(ident.to_string()),
        }
    }

    fn read_number(text: &str) -> TokenKind {
        if text.contains('/') {
            return TokenKind::Rate(text.to_string());
        }
        if text.contains(|c: char| c.is_ascii_alphabetic() || c == '%') {
            return TokenKind::Quantity(text.to_string());
        }
        if text.contains('.') {
            return match text.parse::<f64>() {
                Ok(value) => TokenKind::Float(value),
                Err(_) => TokenKind::Invalid('.'),
            };
        }
        match text.parse::<i64>() {
            Ok(value) => TokenKind::Int(value),
            Err(_) => TokenKind::Invalid(text.chars().next().unwrap_or('0')),
        }
    }
}

fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_module_header() {
        assert_eq!(
            kinds("manifest {}\nimport ./dep.ix"),
            vec![
                TokenKind::Manifest,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Newline,
                TokenKind::Import,
                TokenKind::RelPath("./dep.ix".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hyphenated_keyword_and_ident() {
        assert_eq!(
            kinds("includable-file host-resolution"),
            vec![
                TokenKind::IncludableFile,
                TokenKind::Ident("host-resolution".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_int_range() {
        assert_eq!(
            kinds("1..0"),
            vec![
                TokenKind::Int(1),
                TokenKind::DotDot,
                TokenKind::Int(0),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_quantities_and_rates() {
        assert_eq!(
            kinds("1h30mn 10kB/s 1.5x 5%"),
            vec![
                TokenKind::Quantity("1h30mn".into()),
                TokenKind::Rate("10kB/s".into()),
                TokenKind::Quantity("1.5x".into()),
                TokenKind::Quantity("5%".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_sigils() {
        assert_eq!(
            kinds("$a $$g %int %ns. %ns.m"),
            vec![
                TokenKind::Variable("a".into()),
                TokenKind::GlobalVariable("g".into()),
                TokenKind::PatternIdent("int".into()),
                TokenKind::PatternNs("ns".into()),
                TokenKind::PatternNsMember("ns".into(), "m".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_urls_hosts_and_paths() {
        assert_eq!(
            kinds("https://example.com/lib.ix https://example.com /a/b.ix / ../x"),
            vec![
                TokenKind::Url("https://example.com/lib.ix".into()),
                TokenKind::Host("https://example.com".into()),
                TokenKind::AbsPath("/a/b.ix".into()),
                TokenKind::Slash,
                TokenKind::RelPath("../x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_url_followed_by_brace() {
        assert_eq!(
            kinds("{u: https://a.com/x}"),
            vec![
                TokenKind::LBrace,
                TokenKind::Ident("u".into()),
                TokenKind::Colon,
                TokenKind::Url("https://a.com/x".into()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_openers_and_comments() {
        assert_eq!(
            kinds("#{ :{ .{ %{ # a comment\n=>"),
            vec![
                TokenKind::RecordOpen,
                TokenKind::DictOpen,
                TokenKind::KeyListOpen,
                TokenKind::ObjectPatternOpen,
                TokenKind::Newline,
                TokenKind::FatArrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n""#),
            vec![TokenKind::Str("a\"b\n".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = Lexer::new("var x").tokenize();
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(4, 5));
    }
}
