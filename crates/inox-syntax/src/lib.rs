//! Inox syntax: tokens, lexer, AST, parser and tree walker.
//!
//! # Modules
//!
//! - [`token`]: token kinds produced by the lexer
//! - [`lexer`]: whitespace- and sigil-aware tokenizer
//! - [`ast`]: the syntax tree
//! - [`parser`]: recovering statement parser
//! - [`chunk`]: parsed resources and the parsed-chunk cache
//! - [`walk`]: depth-first traversal with scope tracking

pub mod ast;
pub mod chunk;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod walk;

pub use ast::{Node, NodeId, NodeKind};
pub use chunk::{parse_chunk, parse_chunk_source, ChunkCache, ChunkSource, ParsedChunk, ParserOptions};
pub use parser::{parse, ParseError, ParseFailure, Parser};
pub use token::{Span, Token, TokenKind};
pub use walk::{find_nodes, walk, FnVisitor, TraversalAction, Visit, Visitor};
